use serde::{Deserialize, Serialize};

use super::ClassifyError;

#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub titles: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct SingleRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SingleResponse {
    pub positive: bool,
}

pub fn build_batch_request(titles: &[String]) -> BatchRequest<'_> {
    BatchRequest { titles }
}

/// Decodes a batched response; verdicts are positional, so the length must match.
pub fn parse_batch_response(body: &str, expected: usize) -> Result<Vec<bool>, ClassifyError> {
    let verdicts: Vec<bool> = serde_json::from_str(body).map_err(ClassifyError::Decode)?;
    if verdicts.len() != expected {
        return Err(ClassifyError::LengthMismatch {
            expected,
            actual: verdicts.len(),
        });
    }
    Ok(verdicts)
}

pub fn parse_single_response(body: &str) -> Result<bool, ClassifyError> {
    let response: SingleResponse = serde_json::from_str(body).map_err(ClassifyError::Decode)?;
    Ok(response.positive)
}
