#![forbid(unsafe_code)]

pub mod keys;
pub mod mapping;
pub mod records;

pub mod ids {
    /// Ordering value used to paginate one entity type and checkpoint its progress.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct Cursor(i64);

    impl Cursor {
        pub const BEGINNING: Cursor = Cursor(0);

        pub fn new(value: i64) -> Self {
            Self(value)
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }

    impl std::fmt::Display for Cursor {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    /// Generated row identifier of a reference or primary entity. Always positive.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct SurrogateId(i64);

    impl SurrogateId {
        pub fn new(value: i64) -> Result<Self, SurrogateIdError> {
            if value <= 0 {
                return Err(SurrogateIdError::NotPositive(value));
            }
            Ok(Self(value))
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }

    impl std::fmt::Display for SurrogateId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
    pub enum SurrogateIdError {
        #[error("surrogate id must be positive (got {0})")]
        NotPositive(i64),
    }
}

pub mod entity {
    /// Entity types pulled from the provider. Each one paginates independently.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum EntityType {
        Clients,
        Forms,
        Pricelists,
    }

    impl EntityType {
        /// Default round order.
        pub const ALL: [EntityType; 3] = [Self::Clients, Self::Forms, Self::Pricelists];

        pub fn as_str(self) -> &'static str {
            match self {
                Self::Clients => "clients",
                Self::Forms => "forms",
                Self::Pricelists => "pricelists",
            }
        }

        /// Path segment of the export endpoint.
        pub fn endpoint(self) -> &'static str {
            self.as_str()
        }

        /// Name of the array field holding the records inside a page envelope.
        pub fn envelope_field(self) -> &'static str {
            match self {
                Self::Clients => "Clients",
                Self::Forms => "Forms",
                Self::Pricelists => "Pricelists",
            }
        }

        /// Record field carrying the pagination cursor.
        pub fn cursor_field(self) -> &'static str {
            match self {
                Self::Clients => "TimeStamp",
                Self::Forms => "FormID",
                Self::Pricelists => "ID",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            let value = value.trim();
            Self::ALL
                .into_iter()
                .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value))
        }
    }

    impl std::fmt::Display for EntityType {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }
}
