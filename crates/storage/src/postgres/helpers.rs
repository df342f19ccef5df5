//! Conversions between model values and PostgreSQL column types.

use std::fmt::Display;

use strata_core::error::{StorageError, StorageResult};

/// Convert a `Vec<u8>` to a fixed-size 32-byte array.
///
/// Returns an error if the length doesn't match.
pub fn bytes_to_hash32(bytes: Vec<u8>, field_name: &str) -> StorageResult<[u8; 32]> {
    bytes.try_into().map_err(|v: Vec<u8>| {
        StorageError::SerializationError(format!(
            "{} has invalid length: expected 32, got {}",
            field_name,
            v.len()
        ))
    })
}

/// Convert an integer between its model type and its column type.
///
/// Postgres has no unsigned integers, so `u32`/`u64` model fields are
/// stored as `INTEGER`/`BIGINT`; values outside the target range fail.
pub fn fit<T, U>(value: T, field_name: &str) -> StorageResult<U>
where
    T: Copy + Display,
    U: TryFrom<T>,
{
    U::try_from(value).map_err(|_| {
        StorageError::SerializationError(format!("{} out of range: {}", field_name, value))
    })
}

/// Parse a NUMERIC column read back as text into a u128 amount.
pub fn text_to_amount(text: Option<String>, field_name: &str) -> StorageResult<Option<u128>> {
    text.map(|t| {
        t.parse::<u128>().map_err(|e| {
            StorageError::SerializationError(format!("{} is not a u128 ({}): {}", field_name, t, e))
        })
    })
    .transpose()
}

/// Convert a call address to its INTEGER[] column form.
pub fn address_to_column(address: &[u32]) -> StorageResult<Vec<i32>> {
    address.iter().map(|i| fit(*i, "call.address")).collect()
}

/// Convert an INTEGER[] column back into a call address.
pub fn column_to_address(column: Vec<i32>) -> StorageResult<Vec<u32>> {
    column.into_iter().map(|i| fit(i, "call.address")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_includes_field_name() {
        let bad_bytes = vec![1u8; 16];
        let result = bytes_to_hash32(bad_bytes, "block.parent_hash");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("block.parent_hash"));
        assert!(err.contains("expected 32"));
    }

    #[test]
    fn test_zero_hash_is_a_valid_hash() {
        assert_eq!(bytes_to_hash32(vec![0u8; 32], "block.hash").unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_fit_checks_range_both_ways() {
        let height: i64 = fit(42u64, "block.height").unwrap();
        assert_eq!(height, 42);

        let err = fit::<u64, i64>(u64::MAX, "block.height").unwrap_err();
        assert!(err.to_string().contains("block.height out of range"));

        let err = fit::<u32, i32>(u32::MAX, "block.calls_count").unwrap_err();
        assert!(err.to_string().contains("block.calls_count"));

        assert!(fit::<i32, u32>(-1, "extrinsic.index").is_err());
        assert_eq!(fit::<i64, u64>(7, "event.block_number").unwrap(), 7);
    }

    #[test]
    fn test_amount_text_parsing() {
        assert_eq!(text_to_amount(None, "extrinsic.fee").unwrap(), None);
        assert_eq!(
            text_to_amount(Some("340282366920938463463374607431768211455".into()), "extrinsic.fee")
                .unwrap(),
            Some(u128::MAX)
        );
        let err = text_to_amount(Some("1.5".into()), "extrinsic.tip").unwrap_err();
        assert!(err.to_string().contains("extrinsic.tip"));
    }

    #[test]
    fn test_address_column_conversion() {
        assert_eq!(address_to_column(&[0, 3, 1]).unwrap(), vec![0, 3, 1]);
        assert_eq!(column_to_address(vec![2, 0]).unwrap(), vec![2, 0]);
        assert!(column_to_address(Vec::new()).unwrap().is_empty());
        assert!(address_to_column(&[u32::MAX]).is_err());
        assert!(column_to_address(vec![-1]).is_err());
    }
}
