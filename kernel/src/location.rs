// Object Key Derivation
//
// Maps (tablet id, numeric id or name) to the keys under which metadata,
// logs and data files live in the metadata store. All functions here are
// pure; the store never interprets keys beyond prefix listing.
//
// Layout under the root prefix:
//   {root}/{tablet_id}/meta/{version:016x}.meta
//   {root}/{tablet_id}/log/{txn_id:016x}.log     (pending)
//   {root}/{tablet_id}/log/{txn_id:016x}.slog    (staged)
//   {root}/{tablet_id}/log/{version:016x}.vlog   (versioned)
//   {root}/{tablet_id}/data/{name}
//   {root}/{tablet_id}/meta/schema_{schema_id:016x}

/// Derives store keys for one tablet root.
#[derive(Debug, Clone)]
pub struct LocationProvider {
    root: String,
}

impl LocationProvider {
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }
        Self { root }
    }

    pub fn root_location(&self, tablet_id: u64) -> String {
        format!("{}/{}", self.root, tablet_id)
    }

    pub fn metadata_root_location(&self, tablet_id: u64) -> String {
        format!("{}/{}/meta", self.root, tablet_id)
    }

    pub fn tablet_metadata_location(&self, tablet_id: u64, version: u64) -> String {
        format!("{}/{}/meta/{:016x}.meta", self.root, tablet_id, version)
    }

    pub fn txn_log_location(&self, tablet_id: u64, txn_id: u64) -> String {
        format!("{}/{}/log/{:016x}.log", self.root, tablet_id, txn_id)
    }

    pub fn txn_slog_location(&self, tablet_id: u64, txn_id: u64) -> String {
        format!("{}/{}/log/{:016x}.slog", self.root, tablet_id, txn_id)
    }

    pub fn txn_vlog_location(&self, tablet_id: u64, version: u64) -> String {
        format!("{}/{}/log/{:016x}.vlog", self.root, tablet_id, version)
    }

    pub fn segment_location(&self, tablet_id: u64, segment_name: &str) -> String {
        format!("{}/{}/data/{}", self.root, tablet_id, segment_name)
    }

    pub fn del_location(&self, tablet_id: u64, del_name: &str) -> String {
        format!("{}/{}/data/{}", self.root, tablet_id, del_name)
    }

    pub fn delvec_location(&self, tablet_id: u64, delvec_name: &str) -> String {
        format!("{}/{}/data/{}", self.root, tablet_id, delvec_name)
    }

    pub fn schema_location(&self, tablet_id: u64, schema_id: u64) -> String {
        format!("{}/{}/meta/schema_{:016x}", self.root, tablet_id, schema_id)
    }

    /// Recover the version number from a metadata key produced by
    /// [`tablet_metadata_location`](Self::tablet_metadata_location).
    ///
    /// Returns `None` for keys that are not metadata objects (schema side
    /// table entries share the `meta/` prefix).
    pub fn parse_metadata_version(key: &str) -> Option<u64> {
        let name = key.rsplit('/').next()?;
        let hex = name.strip_suffix(".meta")?;
        u64::from_str_radix(hex, 16).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let lp = LocationProvider::new("s3://bucket/lake/");

        assert_eq!(
            lp.tablet_metadata_location(1, 2),
            "s3://bucket/lake/1/meta/0000000000000002.meta"
        );
        assert_ne!(lp.txn_log_location(1, 7), lp.txn_slog_location(1, 7));
        assert_ne!(lp.txn_slog_location(1, 7), lp.txn_vlog_location(1, 7));
        assert!(lp
            .segment_location(1, "abc.dat")
            .starts_with(&lp.root_location(1)));
    }

    #[test]
    fn metadata_version_round_trips() {
        let lp = LocationProvider::new("root");
        let key = lp.tablet_metadata_location(42, 0xbeef);

        assert_eq!(LocationProvider::parse_metadata_version(&key), Some(0xbeef));
        assert_eq!(
            LocationProvider::parse_metadata_version(&lp.schema_location(42, 1)),
            None
        );
    }
}
