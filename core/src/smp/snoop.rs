//! Cache snoop fabric (§4.13): every `putfield`/`iastore` that commits on
//! one core broadcasts `{handle, field_or_index}` to every other core's
//! semantic caches in the same cycle. The broadcast is purely
//! combinational — it never stalls the issuing core, and a receiving core
//! applies the invalidation as part of its own next cycle regardless of
//! what stage it is in.

/// One snoop broadcast: a field write identifies the field/array slot
/// that changed so the receiving object/array caches can invalidate just
/// that entry; `None` means "invalidate everything for this handle"
/// (used for array length changes and other whole-object writes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnoopEvent {
    pub handle: u32,
    pub field_or_index: Option<u32>,
}

/// Fans a single core's write out to every other core's caches. `apply`
/// is called once per receiving core id (every core except `source_core`)
/// with the event to invalidate.
pub fn broadcast(
    source_core: usize,
    num_cores: usize,
    event: SnoopEvent,
    mut apply: impl FnMut(usize, SnoopEvent),
) {
    for core in 0..num_cores {
        if core != source_core {
            apply(core, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_every_core_but_the_source() {
        let event = SnoopEvent { handle: 7, field_or_index: Some(2) };
        let mut received = Vec::new();
        broadcast(1, 4, event, |core, ev| received.push((core, ev)));
        assert_eq!(received, vec![(0, event), (2, event), (3, event)]);
    }

    #[test]
    fn whole_object_invalidation_carries_no_field_index() {
        let event = SnoopEvent { handle: 3, field_or_index: None };
        let mut received = Vec::new();
        broadcast(0, 2, event, |core, ev| received.push((core, ev)));
        assert_eq!(received, vec![(1, event)]);
    }
}
