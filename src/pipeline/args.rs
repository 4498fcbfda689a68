//! Argument maps
//!
//! An aggregate declares the input columns it reads by role name (`Open`,
//! `Close`, ...). The call's bare parameters name the actual columns and are
//! bound to those roles by position: required roles first, then optional
//! ones, then an optional variadic tail that soaks up the rest.

use crate::pipeline::error::ArgumentError;

/// Declared parameter schema of an aggregate plus the parameters bound to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMap {
    required: Vec<String>,
    optional: Vec<String>,
    variadic: Option<String>,
    bound: Vec<(String, String)>,
    tail: Vec<String>,
}

impl ArgumentMap {
    /// Map with the given required roles
    pub fn new(required: &[&str]) -> Self {
        Self {
            required: required.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Add optional roles bound after the required ones
    pub fn with_optional(mut self, optional: &[&str]) -> Self {
        self.optional = optional.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Accept any number of trailing parameters under `name`
    pub fn with_variadic(mut self, name: &str) -> Self {
        self.variadic = Some(name.to_string());
        self
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Bind call parameters positionally
    ///
    /// Any earlier binding is replaced.
    pub fn prepare(&mut self, params: &[String]) -> Result<(), ArgumentError> {
        if params.len() < self.required.len() {
            return Err(ArgumentError::TooFew {
                required: self.required.len(),
                available: params.len(),
            });
        }
        let max = self.required.len() + self.optional.len();
        if self.variadic.is_none() && params.len() > max {
            return Err(ArgumentError::TooMany {
                max,
                available: params.len(),
            });
        }

        self.bound = self
            .required
            .iter()
            .chain(self.optional.iter())
            .zip(params.iter())
            .map(|(role, column)| (role.clone(), column.clone()))
            .collect();
        self.tail = params.iter().skip(max).cloned().collect();
        Ok(())
    }

    /// Column bound to `role`, if any
    pub fn get(&self, role: &str) -> Option<&str> {
        self.bound
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, column)| column.as_str())
    }

    /// Parameters collected by the variadic tail
    pub fn variadic(&self) -> &[String] {
        &self.tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_binding() {
        let mut map = ArgumentMap::new(&["Open", "Close"]).with_optional(&["Volume"]);
        map.prepare(&params(&["o", "c"])).unwrap();
        assert_eq!(map.get("Open"), Some("o"));
        assert_eq!(map.get("Close"), Some("c"));
        assert_eq!(map.get("Volume"), None);

        map.prepare(&params(&["o", "c", "v"])).unwrap();
        assert_eq!(map.get("Volume"), Some("v"));
    }

    #[test]
    fn test_too_few_reports_counts() {
        let mut map = ArgumentMap::new(&["Open", "High", "Low", "Close"]);
        let err = map.prepare(&params(&["o"])).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::TooFew {
                required: 4,
                available: 1
            }
        );
    }

    #[test]
    fn test_too_many_without_variadic() {
        let mut map = ArgumentMap::new(&["Value"]);
        assert!(matches!(
            map.prepare(&params(&["a", "b"])),
            Err(ArgumentError::TooMany { max: 1, available: 2 })
        ));
    }

    #[test]
    fn test_variadic_tail() {
        let mut map = ArgumentMap::new(&[]).with_variadic("Columns");
        map.prepare(&params(&["a", "b", "c"])).unwrap();
        assert_eq!(map.variadic(), &params(&["a", "b", "c"])[..]);

        map.prepare(&[]).unwrap();
        assert!(map.variadic().is_empty());
    }
}
