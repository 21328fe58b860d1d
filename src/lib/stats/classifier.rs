use tracing::*;

use super::types::{Snapshot, StatsRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Inbound,
    Outbound,
    DataChannel,
    CandidatePair,
    Playout,
}

impl RecordKind {
    pub fn from_type(typ: &str) -> Option<Self> {
        match typ {
            "inbound-rtp" => Some(Self::Inbound),
            "outbound-rtp" => Some(Self::Outbound),
            "data-channel" => Some(Self::DataChannel),
            "candidate-pair" => Some(Self::CandidatePair),
            "media-playout" => Some(Self::Playout),
            _ => None,
        }
    }
}

/// Records of a snapshot grouped by kind, borrowed from the snapshot.
#[derive(Debug, Default)]
pub struct Buckets<'a> {
    pub inbound: Vec<&'a StatsRecord>,
    pub outbound: Vec<&'a StatsRecord>,
    pub datachannel: Vec<&'a StatsRecord>,
    pub candidate_pair: Vec<&'a StatsRecord>,
    pub playout: Vec<&'a StatsRecord>,
}

impl<'a> Buckets<'a> {
    fn bucket_mut(&mut self, kind: RecordKind) -> &mut Vec<&'a StatsRecord> {
        match kind {
            RecordKind::Inbound => &mut self.inbound,
            RecordKind::Outbound => &mut self.outbound,
            RecordKind::DataChannel => &mut self.datachannel,
            RecordKind::CandidatePair => &mut self.candidate_pair,
            RecordKind::Playout => &mut self.playout,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty()
            && self.outbound.is_empty()
            && self.datachannel.is_empty()
            && self.candidate_pair.is_empty()
            && self.playout.is_empty()
    }
}

pub fn classify(snapshot: &Snapshot) -> Buckets<'_> {
    snapshot
        .records()
        .fold(Buckets::default(), |mut buckets, (id, record)| {
            match RecordKind::from_type(&record.typ) {
                Some(kind) => buckets.bucket_mut(kind).push(record),
                None => trace!("Dropping record {id:?} of type {:?}", record.typ),
            }
            buckets
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_by_declared_type() {
        let snapshot: Snapshot = [
            ("in", "inbound-rtp"),
            ("out", "outbound-rtp"),
            ("dc", "data-channel"),
            ("cp", "candidate-pair"),
            ("po", "media-playout"),
            ("codec", "codec"),
            ("remote", "remote-inbound-rtp"),
        ]
        .into_iter()
        .map(|(id, typ)| (id.to_string(), StatsRecord::new(typ)))
        .collect();

        let buckets = classify(&snapshot);
        assert_eq!(buckets.inbound.len(), 1);
        assert_eq!(buckets.outbound.len(), 1);
        assert_eq!(buckets.datachannel.len(), 1);
        assert_eq!(buckets.candidate_pair.len(), 1);
        assert_eq!(buckets.playout.len(), 1);
        assert_eq!(buckets.inbound[0].typ, "inbound-rtp");
    }

    #[test]
    fn empty_snapshot_gives_empty_buckets() {
        assert!(classify(&Snapshot::default()).is_empty());
    }
}
