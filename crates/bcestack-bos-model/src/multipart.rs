//! Multipart upload rules shared by the client session and the service.
//!
//! Both sides enforce the same part-number range and the same completion
//! checks, so a request the client accepts is judged identically by the
//! service.

use std::collections::{BTreeMap, HashSet};

use crate::error::{BosError, BosErrorCode};
use crate::headers::unquote_etag;
use crate::types::{PartETag, PartInfo};

/// Lowest valid part number.
pub const MIN_PART_NUMBER: u32 = 1;
/// Highest valid part number.
pub const MAX_PART_NUMBER: u32 = 10_000;
/// Default minimum size of every part except the last: 5 MiB.
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;
/// Cap on `maxParts` and `maxUploads`.
pub const MAX_LIST_ENTRIES: u32 = 1000;

/// Check that a part number is in `1..=10000`.
///
/// # Errors
///
/// Returns `InvalidArgument` otherwise.
pub fn validate_part_number(part_number: u32) -> Result<(), BosError> {
    if (MIN_PART_NUMBER..=MAX_PART_NUMBER).contains(&part_number) {
        Ok(())
    } else {
        Err(BosError::invalid_argument(format!(
            "Part number must be an integer between {MIN_PART_NUMBER} and {MAX_PART_NUMBER}, got {part_number}"
        )))
    }
}

/// Clamp a requested page size to `1..=1000`, defaulting to 1000.
#[must_use]
pub fn effective_max_entries(requested: Option<u32>) -> u32 {
    requested
        .filter(|n| *n > 0)
        .map_or(MAX_LIST_ENTRIES, |n| n.min(MAX_LIST_ENTRIES))
}

/// Validate a completion request against the recorded parts.
///
/// The order of `requested` is irrelevant. On success, returns the recorded
/// parts in ascending part-number order.
///
/// # Errors
///
/// - `InvalidPart` if the list is empty, repeats a part number, names an
///   unknown part, carries a mismatched ETag, or omits a recorded part
/// - `EntityTooSmall` if a part other than the highest-numbered one is
///   smaller than `min_part_size`
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use bcestack_bos_model::multipart::validate_completion;
/// use bcestack_bos_model::types::{PartETag, PartInfo};
///
/// let mut recorded = BTreeMap::new();
/// for n in 1..=2 {
///     recorded.insert(n, PartInfo {
///         part_number: n,
///         e_tag: format!("etag{n}"),
///         size: 1,
///         last_modified: chrono::Utc::now(),
///     });
/// }
/// let requested = vec![PartETag::new(2, "etag2"), PartETag::new(1, "etag1")];
/// let ordered = validate_completion(&recorded, &requested, 1).unwrap();
/// assert_eq!(ordered[0].part_number, 1);
/// ```
pub fn validate_completion(
    recorded: &BTreeMap<u32, PartInfo>,
    requested: &[PartETag],
    min_part_size: u64,
) -> Result<Vec<PartInfo>, BosError> {
    if requested.is_empty() {
        return Err(BosError::invalid_part(
            "The completion request must list at least one part",
        ));
    }

    let mut seen = HashSet::with_capacity(requested.len());
    let mut ordered: Vec<&PartETag> = requested.iter().collect();
    ordered.sort_by_key(|p| p.part_number);

    let mut parts = Vec::with_capacity(ordered.len());
    for entry in ordered {
        if !seen.insert(entry.part_number) {
            return Err(BosError::invalid_part(format!(
                "Part {} is listed more than once",
                entry.part_number
            )));
        }
        let part = recorded.get(&entry.part_number).ok_or_else(|| {
            BosError::invalid_part(format!("Part {} was never uploaded", entry.part_number))
        })?;
        if !etags_match(&part.e_tag, &entry.e_tag) {
            return Err(BosError::invalid_part(format!(
                "ETag of part {} does not match",
                entry.part_number
            )));
        }
        parts.push(part.clone());
    }

    if let Some(missing) = recorded.keys().find(|n| !seen.contains(*n)) {
        return Err(BosError::invalid_part(format!(
            "Uploaded part {missing} is missing from the completion request"
        )));
    }

    if let Some((_, non_final)) = parts.split_last() {
        if let Some(small) = non_final.iter().find(|p| p.size < min_part_size) {
            return Err(BosError::with_message(
                BosErrorCode::EntityTooSmall,
                format!(
                    "Part {} is {} bytes; every part but the last must be at least {min_part_size} bytes",
                    small.part_number, small.size
                ),
            ));
        }
    }

    Ok(parts)
}

/// One page of a part listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartPage {
    /// Parts after the marker, ascending.
    pub parts: Vec<PartInfo>,
    /// Whether more parts follow.
    pub is_truncated: bool,
    /// Part number to pass as the next marker. The last listed part number,
    /// or the marker itself when the page is empty.
    pub next_part_number_marker: u32,
}

/// Page through parts in ascending part-number order: parts numbered above
/// `marker`, at most `max_parts` of them.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use bcestack_bos_model::multipart::paginate_parts;
/// use bcestack_bos_model::types::PartInfo;
///
/// let parts: BTreeMap<u32, PartInfo> = (1..=5)
///     .map(|n| (n, PartInfo { part_number: n, e_tag: String::new(), size: 1, last_modified: chrono::Utc::now() }))
///     .collect();
/// let page = paginate_parts(&parts, 2, 2);
/// assert_eq!(page.parts.iter().map(|p| p.part_number).collect::<Vec<_>>(), vec![3, 4]);
/// assert!(page.is_truncated);
/// assert_eq!(page.next_part_number_marker, 4);
/// ```
#[must_use]
pub fn paginate_parts(parts: &BTreeMap<u32, PartInfo>, marker: u32, max_parts: u32) -> PartPage {
    let limit = max_parts as usize;
    let mut after_marker = parts
        .range((std::ops::Bound::Excluded(marker), std::ops::Bound::Unbounded))
        .map(|(_, part)| part);
    let page: Vec<PartInfo> = after_marker.by_ref().take(limit).cloned().collect();
    let is_truncated = after_marker.next().is_some();
    let next_part_number_marker = page.last().map_or(marker, |p| p.part_number);

    PartPage {
        parts: page,
        is_truncated,
        next_part_number_marker,
    }
}

fn etags_match(recorded: &str, requested: &str) -> bool {
    unquote_etag(recorded).eq_ignore_ascii_case(unquote_etag(requested))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn recorded(sizes: &[(u32, u64)]) -> BTreeMap<u32, PartInfo> {
        sizes
            .iter()
            .map(|(n, size)| {
                (
                    *n,
                    PartInfo {
                        part_number: *n,
                        e_tag: format!("etag{n}"),
                        size: *size,
                        last_modified: Utc::now(),
                    },
                )
            })
            .collect()
    }

    fn etags(numbers: &[u32]) -> Vec<PartETag> {
        numbers
            .iter()
            .map(|n| PartETag::new(*n, format!("etag{n}")))
            .collect()
    }

    #[test]
    fn test_should_validate_part_number_range() {
        assert!(validate_part_number(1).is_ok());
        assert!(validate_part_number(10_000).is_ok());
        assert_eq!(
            validate_part_number(0).unwrap_err().code,
            BosErrorCode::InvalidArgument
        );
        assert_eq!(
            validate_part_number(10_001).unwrap_err().code,
            BosErrorCode::InvalidArgument
        );
    }

    #[test]
    fn test_should_accept_any_input_order() {
        let parts = recorded(&[(1, 10), (2, 10), (3, 1)]);
        let ordered = validate_completion(&parts, &etags(&[3, 1, 2]), 10).unwrap();
        let numbers: Vec<u32> = ordered.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_should_reject_empty_list() {
        let parts = recorded(&[(1, 10)]);
        let err = validate_completion(&parts, &[], 0).unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidPart);
    }

    #[test]
    fn test_should_reject_duplicate_part_numbers() {
        let parts = recorded(&[(1, 10), (2, 10)]);
        let err = validate_completion(&parts, &etags(&[1, 1, 2]), 0).unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidPart);
    }

    #[test]
    fn test_should_reject_unknown_part() {
        let parts = recorded(&[(1, 10)]);
        let err = validate_completion(&parts, &etags(&[1, 2]), 0).unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidPart);
    }

    #[test]
    fn test_should_reject_missing_recorded_part() {
        let parts = recorded(&[(1, 10), (2, 10), (3, 10)]);
        let err = validate_completion(&parts, &etags(&[1, 3]), 0).unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidPart);
    }

    #[test]
    fn test_should_reject_mismatched_etag() {
        let parts = recorded(&[(1, 10)]);
        let err = validate_completion(&parts, &[PartETag::new(1, "other")], 0).unwrap_err();
        assert_eq!(err.code, BosErrorCode::InvalidPart);
    }

    #[test]
    fn test_should_compare_etags_ignoring_quotes_and_case() {
        let parts = recorded(&[(1, 10)]);
        assert!(validate_completion(&parts, &[PartETag::new(1, "\"ETAG1\"")], 0).is_ok());
    }

    #[test]
    fn test_should_reject_small_non_final_part() {
        let parts = recorded(&[(1, 4), (2, 10)]);
        let err = validate_completion(&parts, &etags(&[1, 2]), 5).unwrap_err();
        assert_eq!(err.code, BosErrorCode::EntityTooSmall);
    }

    #[test]
    fn test_should_allow_small_final_part() {
        let parts = recorded(&[(1, 5), (7, 1)]);
        assert!(validate_completion(&parts, &etags(&[7, 1]), 5).is_ok());
    }

    #[test]
    fn test_should_paginate_with_markers() {
        let sizes: Vec<(u32, u64)> = (1..=10).map(|n| (n, 1)).collect();
        let parts = recorded(&sizes);
        let full = paginate_parts(&parts, 0, 1000);
        assert_eq!(full.parts.len(), 10);
        assert!(!full.is_truncated);
        assert_eq!(full.next_part_number_marker, 10);

        let empty = paginate_parts(&parts, 10, 5);
        assert!(empty.parts.is_empty());
        assert_eq!(empty.next_part_number_marker, 10);
    }

    #[test]
    fn test_should_clamp_max_entries() {
        assert_eq!(effective_max_entries(None), 1000);
        assert_eq!(effective_max_entries(Some(0)), 1000);
        assert_eq!(effective_max_entries(Some(5000)), 1000);
        assert_eq!(effective_max_entries(Some(7)), 7);
    }
}
