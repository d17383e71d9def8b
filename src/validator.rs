use thiserror::Error;

/// Upper bound of addresses accepted in a single submission, the bulk endpoint limit
pub const MAX_IPS: usize = 50;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No valid IP addresses provided")]
    EmptyInput,
    #[error("Maximum {max} IP addresses allowed at once")]
    TooManyInputs { count: usize, max: usize },
}

/// Ordered, bounded list of candidate IP addresses.
///
/// Items are trimmed and non-empty, but they are not checked to be valid IP addresses:
/// the upstream API does it for us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpList(Vec<String>);

impl IpList {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let ips: Vec<String> = text
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        match ips.len() {
            0 => Err(ValidationError::EmptyInput),
            count if count > MAX_IPS => Err(ValidationError::TooManyInputs {
                count,
                max: MAX_IPS,
            }),
            _ => Ok(Self(ips)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Bulk form of the list as used in the request path
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl AsRef<[String]> for IpList {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}
