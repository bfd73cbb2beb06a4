use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Wrapper for contact details captured at the booking desk, walk-in phone
/// numbers in particular. The log formats keep only the last four
/// characters, enough to read a number back to a caller without putting the
/// whole value into a log line.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> Masked<T> {
    fn masked(&self) -> String {
        let raw = self.0.to_string();
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // API responses carry the real value; only the log formats mask it.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: PartialEq> PartialEq for Masked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_formats_keep_last_four() {
        let phone = Masked("07700900123".to_string());
        assert_eq!(format!("{:?}", phone), "****0123");
        assert_eq!(format!("{}", phone), "****0123");
    }

    #[test]
    fn test_short_values_fully_masked() {
        let pin = Masked("1234".to_string());
        assert_eq!(format!("{:?}", pin), "****");
    }

    #[test]
    fn test_serialize_passes_through() {
        let phone = Masked("07700900123".to_string());
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"07700900123\"");
    }
}
