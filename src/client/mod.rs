pub mod abi;
pub mod provider;
pub mod rpc;
pub mod signer;

pub use provider::{CallRequest, ReadProvider, Signer};
pub use rpc::HttpRpcClient;
pub use signer::RpcSigner;
