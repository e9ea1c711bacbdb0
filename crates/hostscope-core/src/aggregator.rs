//! Identity aggregation.

use std::collections::HashSet;

use device_inventory::DeviceId;

use crate::domain::Refusal;

/// Deduplicate matched identities, keeping first-seen order.
///
/// Refuses with [`Refusal::AggregateTooLarge`] when more than `ceiling`
/// unique identities remain. An empty input yields an empty set; callers
/// skip enrichment in that case.
pub fn aggregate(identities: Vec<DeviceId>, ceiling: usize) -> Result<Vec<DeviceId>, Refusal> {
    let mut seen = HashSet::with_capacity(identities.len());
    let unique: Vec<DeviceId> = identities
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if unique.len() > ceiling {
        return Err(Refusal::AggregateTooLarge {
            matches: unique.len(),
            limit: ceiling,
        });
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<DeviceId> {
        (0..n).map(|i| DeviceId::new(format!("aid-{i}"))).collect()
    }

    #[test]
    fn test_duplicates_collapse_in_first_seen_order() {
        let input = vec![
            DeviceId::new("b"),
            DeviceId::new("a"),
            DeviceId::new("b"),
            DeviceId::new("c"),
            DeviceId::new("a"),
        ];
        let unique = aggregate(input, 5000).unwrap();
        assert_eq!(
            unique,
            vec![DeviceId::new("b"), DeviceId::new("a"), DeviceId::new("c")]
        );
    }

    #[test]
    fn test_empty_is_empty() {
        assert!(aggregate(Vec::new(), 5000).unwrap().is_empty());
    }

    #[test]
    fn test_exactly_at_ceiling_passes() {
        assert_eq!(aggregate(ids(5000), 5000).unwrap().len(), 5000);
    }

    #[test]
    fn test_one_over_ceiling_is_refused() {
        assert_eq!(
            aggregate(ids(5001), 5000).unwrap_err(),
            Refusal::AggregateTooLarge {
                matches: 5001,
                limit: 5000
            }
        );
    }

    #[test]
    fn test_ceiling_counts_unique_not_raw() {
        let mut input = ids(5000);
        input.extend(ids(5000));
        assert_eq!(aggregate(input, 5000).unwrap().len(), 5000);
    }
}
