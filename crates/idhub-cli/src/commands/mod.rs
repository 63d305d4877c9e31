pub mod keygen;
pub mod vc;
pub mod verify;

/// Read an argument that may be inline text or a path to a file.
pub fn read_inline_or_file(value: &str) -> anyhow::Result<String> {
    if std::path::Path::new(value).exists() {
        Ok(std::fs::read_to_string(value)?)
    } else {
        Ok(value.to_string())
    }
}
