/// 认证 token 头
pub static HEADER_TOKEN: &str = "X-TRAQ-BOT-TOKEN";
/// 事件类型头
pub static HEADER_EVENT: &str = "X-TRAQ-BOT-EVENT";
/// 投递 id 头
pub static HEADER_REQUEST_ID: &str = "X-TRAQ-BOT-REQUEST-ID";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PATH: &str = "/";
/// 1 MB
pub const DEFAULT_BODY_SIZE_LIMIT: usize = 1024 * 1024;

pub static ENV_VERIFICATION_TOKEN: &str = "BOT_VERIFICATION_TOKEN";
pub static ENV_PORT: &str = "BOT_PORT";
pub static ENV_PATH: &str = "BOT_PATH";
pub static ENV_BODY_SIZE_LIMIT: &str = "BOT_BODY_SIZE_LIMIT";
pub static ENV_HANDLER_FAILURE: &str = "BOT_HANDLER_FAILURE";
