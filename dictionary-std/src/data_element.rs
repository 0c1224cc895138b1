//! Standard data element dictionary implementation.

use crate::entries::ENTRIES;
use dcmkit_core::dictionary::TagRange::{Element100, Group100};
use dcmkit_core::dictionary::{
    DataDictionary, DictionaryEntryRef, Multiplicity, TagRange, VirtualVr,
};
use dcmkit_core::{Tag, VR};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static DICT: Lazy<StandardDataDictionaryRegistry> = Lazy::new(init_dictionary);

/// Retrieve a singleton instance of the standard dictionary registry.
///
/// The unit type [`StandardDataDictionary`] already provides
/// a lazily loaded singleton implementing the necessary traits,
/// so calling this is rarely necessary.
#[inline]
pub fn registry() -> &'static StandardDataDictionaryRegistry {
    &DICT
}

/// The data struct actually containing the standard dictionary index.
///
/// This structure is made opaque via the unit type
/// [`StandardDataDictionary`].
#[derive(Debug)]
pub struct StandardDataDictionaryRegistry {
    /// mapping: keyword → entry
    by_keyword: HashMap<&'static str, &'static DictionaryEntryRef<'static>>,
    /// mapping: tag → entry
    by_tag: HashMap<Tag, &'static DictionaryEntryRef<'static>>,
    /// repeating elements of the form (GGxx,EEEE), `xx` zeroed
    repeating_ggxx: HashSet<Tag>,
    /// repeating elements of the form (GGGG,EExx), `xx` zeroed
    repeating_eexx: HashSet<Tag>,
}

impl StandardDataDictionaryRegistry {
    fn new() -> StandardDataDictionaryRegistry {
        StandardDataDictionaryRegistry {
            by_keyword: HashMap::with_capacity(ENTRIES.len()),
            by_tag: HashMap::with_capacity(ENTRIES.len()),
            repeating_ggxx: HashSet::with_capacity(8),
            repeating_eexx: HashSet::new(),
        }
    }

    fn index(&mut self, entry: &'static DictionaryEntryRef<'static>) -> &mut Self {
        self.by_keyword.insert(entry.keyword, entry);
        self.by_tag.insert(entry.tag.inner(), entry);
        match entry.tag {
            Group100(tag) => {
                self.repeating_ggxx.insert(tag);
            }
            Element100(tag) => {
                self.repeating_eexx.insert(tag);
            }
            _ => {}
        }
        self
    }
}

fn init_dictionary() -> StandardDataDictionaryRegistry {
    let mut d = StandardDataDictionaryRegistry::new();
    for entry in ENTRIES {
        d.index(entry);
    }
    d
}

/// Generic group length dictionary entry.
static GROUP_LENGTH_ENTRY: DictionaryEntryRef<'static> = DictionaryEntryRef {
    tag: TagRange::GroupLength,
    keyword: "GenericGroupLength",
    name: "Generic Group Length",
    vr: VirtualVr::Exact(VR::UL),
    vm: Multiplicity::ONE,
    retired: false,
};

/// Generic private creator dictionary entry.
static PRIVATE_CREATOR_ENTRY: DictionaryEntryRef<'static> = DictionaryEntryRef {
    tag: TagRange::PrivateCreator,
    keyword: "PrivateCreator",
    name: "Private Creator",
    vr: VirtualVr::Exact(VR::LO),
    vm: Multiplicity::ONE,
    retired: false,
};

/// A data element dictionary which consults
/// the library's standard attribute registry.
///
/// This is the type to use whenever an attribute dictionary
/// is needed. The index is built upon first use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StandardDataDictionary;

impl StandardDataDictionary {
    fn indexed_tag(tag: Tag) -> Option<&'static DictionaryEntryRef<'static>> {
        let r = registry();

        r.by_tag
            .get(&tag)
            .or_else(|| {
                // tags repeating across groups
                let group_trimmed = Tag(tag.0 & 0xFF00, tag.1);
                if r.repeating_ggxx.contains(&group_trimmed) {
                    return r.by_tag.get(&group_trimmed);
                }
                // tags repeating across elements
                let elem_trimmed = Tag(tag.0, tag.1 & 0xFF00);
                if r.repeating_eexx.contains(&elem_trimmed) {
                    return r.by_tag.get(&elem_trimmed);
                }
                None
            })
            .copied()
            .or_else(|| {
                if tag.is_private_creator() {
                    return Some(&PRIVATE_CREATOR_ENTRY);
                }
                if tag.element() == 0x0000 {
                    return Some(&GROUP_LENGTH_ENTRY);
                }
                None
            })
    }
}

impl DataDictionary for StandardDataDictionary {
    type Entry = DictionaryEntryRef<'static>;

    fn by_tag(&self, tag: Tag) -> Option<&'static DictionaryEntryRef<'static>> {
        StandardDataDictionary::indexed_tag(tag)
    }

    fn by_keyword(&self, keyword: &str) -> Option<&'static DictionaryEntryRef<'static>> {
        registry().by_keyword.get(keyword).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::StandardDataDictionary;
    use dcmkit_core::dictionary::{DataDictionary, TagRange, VirtualVr};
    use dcmkit_core::{Tag, VR};

    #[test]
    fn lookup_by_tag_and_keyword() {
        let dict = StandardDataDictionary;
        let entry = dict.by_tag(Tag(0x0010, 0x0010)).unwrap();
        assert_eq!(entry.keyword, "PatientName");
        assert_eq!(entry.name, "Patient's Name");
        assert_eq!(entry.vr, VirtualVr::Exact(VR::PN));
        assert!(!entry.retired);

        let entry = dict.by_keyword("Modality").unwrap();
        assert_eq!(entry.tag, TagRange::Single(Tag(0x0008, 0x0060)));
    }

    #[test]
    fn lookup_context_dependent_vrs() {
        let dict = StandardDataDictionary;
        assert_eq!(dict.by_tag(Tag(0x7FE0, 0x0010)).unwrap().vr, VirtualVr::Px);
        assert_eq!(
            dict.by_tag(Tag(0x0028, 0x0106)).unwrap().vr,
            VirtualVr::Xs
        );
        assert_eq!(dict.by_tag(Tag(0x0028, 0x3006)).unwrap().vr, VirtualVr::Lt);
    }

    #[test]
    fn lookup_masked_entries() {
        let dict = StandardDataDictionary;
        // any even overlay group matches the 60xx pattern
        let entry = dict.by_tag(Tag(0x6004, 0x3000)).unwrap();
        assert_eq!(entry.keyword, "OverlayData");
        assert_eq!(entry.vr, VirtualVr::Ox);

        let entry = dict.by_tag(Tag(0x5002, 0x0010)).unwrap();
        assert_eq!(entry.keyword, "NumberOfPoints");
        assert!(entry.retired);
    }

    #[test]
    fn lookup_generic_fallbacks() {
        let dict = StandardDataDictionary;
        let entry = dict.by_tag(Tag(0x0009, 0x0010)).unwrap();
        assert_eq!(entry.keyword, "PrivateCreator");
        assert_eq!(entry.vr, VirtualVr::Exact(VR::LO));

        let entry = dict.by_tag(Tag(0x019, 0x0000)).unwrap();
        assert_eq!(entry.keyword, "GenericGroupLength");

        // unknown private data elements have no entry
        assert!(dict.by_tag(Tag(0x0009, 0x1001)).is_none());
    }
}
