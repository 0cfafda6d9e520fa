mod ops_client;
mod response_decoder;

pub use ops_client::{Credential, OpsClient, OpsRequest};
pub use response_decoder::{decode, RAW_CONTENT_KEY, RAW_XML_KEY};
