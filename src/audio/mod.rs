mod formats;

pub use formats::{file_name, filter_supported, is_supported_format, SUPPORTED_EXTENSIONS};
