mod debug_response_body;
pub use self::debug_response_body::*;

mod dispatcher;
pub use self::dispatcher::*;

mod query_params_store;
pub use self::query_params_store::*;

mod request_body;
pub use self::request_body::*;

mod request_path_formatter;
pub use self::request_path_formatter::*;
