use anyhow::{Result, anyhow};

/// The only boundary check before a send: a request without recipients is
/// rejected up front and never reaches the gateway. Individual token shape
/// is left for the gateway to judge, since only its verdict may feed cleanup.
pub fn validate_token_list(tokens: &[String]) -> Result<()> {
    if tokens.is_empty() {
        return Err(anyhow!("No valid tokens provided"));
    }

    Ok(())
}
