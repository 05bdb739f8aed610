use core::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use serde_json::Value;

use crate::error::BuildError;

/// Named collections of keywords defined by drafts 2019-09 and 2020-12.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    Metadata,
    Format,
    FormatAnnotation,
    Content,
}

impl FromStr for Vocabulary {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "https://json-schema.org/draft/2020-12/vocab/core"
            | "https://json-schema.org/draft/2019-09/vocab/core" => Ok(Vocabulary::Core),
            "https://json-schema.org/draft/2020-12/vocab/applicator"
            | "https://json-schema.org/draft/2019-09/vocab/applicator" => {
                Ok(Vocabulary::Applicator)
            }
            "https://json-schema.org/draft/2020-12/vocab/unevaluated" => {
                Ok(Vocabulary::Unevaluated)
            }
            "https://json-schema.org/draft/2020-12/vocab/validation"
            | "https://json-schema.org/draft/2019-09/vocab/validation" => {
                Ok(Vocabulary::Validation)
            }
            "https://json-schema.org/draft/2020-12/vocab/meta-data"
            | "https://json-schema.org/draft/2019-09/vocab/meta-data" => Ok(Vocabulary::Metadata),
            "https://json-schema.org/draft/2020-12/vocab/format-assertion"
            | "https://json-schema.org/draft/2019-09/vocab/format" => Ok(Vocabulary::Format),
            "https://json-schema.org/draft/2020-12/vocab/format-annotation" => {
                Ok(Vocabulary::FormatAnnotation)
            }
            "https://json-schema.org/draft/2020-12/vocab/content"
            | "https://json-schema.org/draft/2019-09/vocab/content" => Ok(Vocabulary::Content),
            _ => Err(()),
        }
    }
}

const fn bit(vocabulary: Vocabulary) -> u8 {
    match vocabulary {
        Vocabulary::Core => 1 << 0,
        Vocabulary::Applicator => 1 << 1,
        Vocabulary::Unevaluated => 1 << 2,
        Vocabulary::Validation => 1 << 3,
        Vocabulary::Metadata => 1 << 4,
        Vocabulary::Format => 1 << 5,
        Vocabulary::FormatAnnotation => 1 << 6,
        Vocabulary::Content => 1 << 7,
    }
}

/// The set of vocabularies active for one schema resource.
///
/// Drafts 6 and 7 predate vocabularies; their set is unrestricted and every
/// keyword applies.
#[derive(Clone, PartialEq, Eq)]
pub struct VocabularySet {
    restricted: bool,
    known: u8,
    custom: AHashSet<String>,
}

impl fmt::Debug for VocabularySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.restricted {
            return f.write_str("[unrestricted]");
        }
        let mut list = f.debug_list();
        for (name, vocabulary) in [
            ("core", Vocabulary::Core),
            ("applicator", Vocabulary::Applicator),
            ("unevaluated", Vocabulary::Unevaluated),
            ("validation", Vocabulary::Validation),
            ("meta-data", Vocabulary::Metadata),
            ("format", Vocabulary::Format),
            ("format-annotation", Vocabulary::FormatAnnotation),
            ("content", Vocabulary::Content),
        ] {
            if self.known & bit(vocabulary) != 0 {
                list.entry(&name);
            }
        }
        let mut custom: Vec<_> = self.custom.iter().collect();
        custom.sort_unstable();
        for uri in custom {
            list.entry(&uri);
        }
        list.finish()
    }
}

impl VocabularySet {
    pub(crate) fn unrestricted() -> Self {
        Self {
            restricted: false,
            known: 0,
            custom: AHashSet::new(),
        }
    }

    pub(crate) fn draft_2019_09() -> Self {
        Self::from_known(
            bit(Vocabulary::Core)
                | bit(Vocabulary::Applicator)
                | bit(Vocabulary::Validation)
                | bit(Vocabulary::Metadata)
                | bit(Vocabulary::Content),
        )
    }

    pub(crate) fn draft_2020_12() -> Self {
        Self::from_known(
            bit(Vocabulary::Core)
                | bit(Vocabulary::Applicator)
                | bit(Vocabulary::Unevaluated)
                | bit(Vocabulary::Validation)
                | bit(Vocabulary::Metadata)
                | bit(Vocabulary::FormatAnnotation)
                | bit(Vocabulary::Content),
        )
    }

    fn from_known(known: u8) -> Self {
        Self {
            restricted: true,
            known,
            custom: AHashSet::new(),
        }
    }

    pub(crate) fn add(&mut self, vocabulary: Vocabulary) {
        self.restricted = true;
        self.known |= bit(vocabulary);
    }

    /// Whether keywords from the given vocabulary participate in validation.
    #[must_use]
    pub fn enables(&self, vocabulary: Vocabulary) -> bool {
        !self.restricted || self.known & bit(vocabulary) != 0
    }
}

/// Parse the `$vocabulary` object of a schema resource, if present.
///
/// Unknown vocabulary URIs marked as required are kept as opaque custom
/// entries; the engine has no keywords for them, so they only affect
/// bookkeeping.
pub(crate) fn find(document: &Value) -> Result<Option<VocabularySet>, BuildError> {
    let Some(vocabularies) = document.get("$vocabulary") else {
        return Ok(None);
    };
    let Some(vocabularies) = vocabularies.as_object() else {
        return Err(BuildError::invalid_keyword(
            "$vocabulary",
            "expected an object of URI to boolean entries",
        ));
    };
    let mut set = VocabularySet {
        restricted: true,
        known: 0,
        custom: AHashSet::new(),
    };
    for (uri, enabled) in vocabularies {
        if enabled.as_bool().unwrap_or(false) {
            match Vocabulary::from_str(uri) {
                Ok(vocabulary) => set.add(vocabulary),
                Err(()) => {
                    set.custom.insert(uri.clone());
                }
            }
        }
    }
    Ok(Some(set))
}
