//! Validators for declared entries.
//!
//! A validator inspects a coerced value and rejects it with a reason. It
//! runs against the entry's default at declaration time and against every
//! document value during reconciliation.

use std::fmt::Display;

/// A validation function for entry values.
///
/// Returns `Err(reason)` to reject a value; the reason ends up in the
/// `Validation` error together with the entry's path.
pub type Validator<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// Require a value within an inclusive range.
pub fn in_range<T>(min: T, max: T) -> Validator<T>
where
	T: PartialOrd + Display + Send + Sync + 'static,
{
	Box::new(move |value| {
		if *value < min || *value > max {
			Err(format!("must be in [{min}, {max}], got {value}"))
		} else {
			Ok(())
		}
	})
}

/// Require a value greater than or equal to a minimum.
pub fn at_least<T>(min: T) -> Validator<T>
where
	T: PartialOrd + Display + Send + Sync + 'static,
{
	Box::new(move |value| {
		if *value < min {
			Err(format!("must be at least {min}, got {value}"))
		} else {
			Ok(())
		}
	})
}

/// Require a value less than or equal to a maximum.
pub fn at_most<T>(max: T) -> Validator<T>
where
	T: PartialOrd + Display + Send + Sync + 'static,
{
	Box::new(move |value| {
		if *value > max {
			Err(format!("must be at most {max}, got {value}"))
		} else {
			Ok(())
		}
	})
}

/// Require a non-empty string.
pub fn non_empty() -> Validator<String> {
	Box::new(|value| {
		if value.is_empty() {
			Err("must not be empty".to_string())
		} else {
			Ok(())
		}
	})
}

/// Require a string of ASCII letters and digits only.
pub fn alphanumeric() -> Validator<String> {
	Box::new(|value| {
		if value.chars().all(|c| c.is_ascii_alphanumeric()) {
			Ok(())
		} else {
			Err("must be alphanumeric".to_string())
		}
	})
}

/// Combine validators; all must accept the value.
pub fn all_of<T: 'static>(validators: Vec<Validator<T>>) -> Validator<T> {
	Box::new(move |value| {
		for validator in &validators {
			validator(value)?;
		}
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_in_range() {
		let port = in_range(1_i64, 65535);
		assert!(port(&8080).is_ok());
		assert!(port(&1).is_ok());
		assert!(port(&65535).is_ok());

		let err = port(&99999).unwrap_err();
		assert!(err.contains("[1, 65535]"));
		assert!(err.contains("99999"));
	}

	#[test]
	fn test_at_least_and_at_most() {
		let min = at_least(0.0);
		assert!(min(&0.0).is_ok());
		assert!(min(&-0.1).is_err());

		let max = at_most(10_i64);
		assert!(max(&10).is_ok());
		assert!(max(&11).is_err());
	}

	#[test]
	fn test_non_empty() {
		let validator = non_empty();
		assert!(validator(&"x".to_string()).is_ok());
		assert!(validator(&String::new()).is_err());
	}

	#[test]
	fn test_alphanumeric() {
		let validator = alphanumeric();
		assert!(validator(&"abc123".to_string()).is_ok());
		assert!(validator(&"has space".to_string()).is_err());
		assert!(validator(&"dash-ed".to_string()).is_err());
	}

	#[test]
	fn test_all_of() {
		let validator = all_of(vec![non_empty(), alphanumeric()]);
		assert!(validator(&"ok42".to_string()).is_ok());
		assert!(validator(&String::new()).is_err());
		assert!(validator(&"no!".to_string()).is_err());
	}
}
