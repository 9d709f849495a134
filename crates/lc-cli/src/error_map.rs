use lc_core::ConvertError;

pub(crate) fn emit_error(error: &ConvertError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code());
    println!("ERROR_MSG_JSON:{}", message_json(&error.to_string()));
    1
}

fn message_json(message: &str) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| format!("{:?}", message))
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> ConvertError {
    ConvertError::io("cannot resolve source path", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> ConvertError {
    ConvertError::io("cannot read problem file", error)
}

pub(crate) fn map_cli_output_write(error: std::io::Error) -> ConvertError {
    ConvertError::io("cannot write output", error)
}

pub(crate) fn map_cli_output_json(error: serde_json::Error) -> ConvertError {
    ConvertError::io("cannot serialize output", error)
}
