//! Contract interfaces read by the chef fetchers

use alloy::{
    primitives::{keccak256, Bytes},
    sol,
};

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }

    /// `poolInfo` layouts differ between forks; fields are read by word index
    interface IMasterChef {
        function totalAllocPoint() external view returns (uint256);
        function getMultiplier(uint256 from, uint256 to) external view returns (uint256);
        function poolInfo(uint256 pid) external view;
    }

    interface IRewarder {
        function rewardPerSecond() external view returns (uint256);
        function poolInfo(uint256 pid) external view;
    }
}

/// Calldata for an argument-less getter whose name comes from configuration,
/// e.g. `cakePerBlock` or `sushiPerSecond`
pub fn getter_call(name: &str) -> Bytes {
    keccak256(format!("{}()", name))[..4].to_vec().into()
}
