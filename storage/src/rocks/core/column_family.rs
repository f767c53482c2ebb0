/// Column families used in veridb storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    /// Leaf records: index -> (entry, leaf hash)
    Leaves,
    /// Interior-node hash cache: (level, position) -> hash.
    /// Only complete subtrees are stored; entries are immutable once written.
    Nodes,
    /// Key index: key -> append history (latest index last)
    KeyIndex,
    /// Log metadata (committed size)
    Meta,
}

impl ColumnFamily {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Leaves => "leaves",
            Self::Nodes => "nodes",
            Self::KeyIndex => "key_index",
            Self::Meta => "meta",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::Leaves, Self::Nodes, Self::KeyIndex, Self::Meta]
    }

    pub fn descriptors() -> Vec<rocksdb::ColumnFamilyDescriptor> {
        Self::all()
            .into_iter()
            .map(|cf| {
                let mut opts = rocksdb::Options::default();
                match cf {
                    Self::Leaves => {
                        // Raw entry payloads: write-heavy, append-only
                        opts.set_write_buffer_size(64 * 1024 * 1024);
                        opts.set_max_write_buffer_number(4);
                        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
                    }
                    Self::Nodes => {
                        // Hash cache: high read rate during proof generation
                        opts.set_write_buffer_size(64 * 1024 * 1024);
                        opts.set_max_write_buffer_number(4);
                        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
                    }
                    Self::KeyIndex => {
                        opts.set_write_buffer_size(32 * 1024 * 1024);
                        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
                    }
                    Self::Meta => {
                        // Single small record, rewritten every append
                        opts.set_write_buffer_size(8 * 1024 * 1024);
                    }
                }
                rocksdb::ColumnFamilyDescriptor::new(cf.name(), opts)
            })
            .collect()
    }
}

impl std::fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
