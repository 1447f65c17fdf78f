use super::*;
use std::collections::HashSet;

#[test]
fn test_seq_id_roundtrip() {
    let id = SeqId::new(7);
    assert_eq!(id.index(), 7);
    assert_eq!(id.raw(), 7);
    assert_eq!(format!("{id:?}"), "SeqId(7)");
}

#[test]
fn test_seq_id_hash() {
    let set: HashSet<SeqId> = [SeqId::new(1), SeqId::new(1), SeqId::new(2)].into_iter().collect();
    assert_eq!(set.len(), 2);
}
