//! Registry of known vendor-specific (private) attributes.
//!
//! Private data elements are identified by the creator string
//! registered in the group's creator slot plus the low byte
//! of the element number. The table below carries a small set
//! of well-known vendor additions; like the standard table,
//! it is emitted by the external generation step.

use dcmkit_core::dictionary::VirtualVr::Exact;
use dcmkit_core::dictionary::{DictionaryEntryRef, Multiplicity, PrivateDictionary, TagRange};
use dcmkit_core::{Tag, VR};
use once_cell::sync::Lazy;
use std::collections::HashMap;

struct PrivateRecord {
    creator: &'static str,
    group: u16,
    item: u8,
    entry: DictionaryEntryRef<'static>,
}

const fn private(
    creator: &'static str,
    group: u16,
    item: u8,
    keyword: &'static str,
    name: &'static str,
    vr: VR,
) -> PrivateRecord {
    PrivateRecord {
        creator,
        group,
        item,
        entry: DictionaryEntryRef {
            // representative tag, assuming the canonical 0x10 slot
            tag: TagRange::Single(Tag(group, 0x1000 | item as u16)),
            keyword,
            name,
            vr: Exact(vr),
            vm: Multiplicity::ONE,
            retired: false,
        },
    }
}

#[rustfmt::skip]
static RECORDS: &[PrivateRecord] = &[
    private("SIEMENS CSA HEADER", 0x0029, 0x08, "CSAImageHeaderType", "CSA Image Header Type", VR::CS),
    private("SIEMENS CSA HEADER", 0x0029, 0x09, "CSAImageHeaderVersion", "CSA Image Header Version", VR::LO),
    private("SIEMENS CSA HEADER", 0x0029, 0x10, "CSAImageHeaderInfo", "CSA Image Header Info", VR::OB),
    private("SIEMENS CSA HEADER", 0x0029, 0x18, "CSASeriesHeaderType", "CSA Series Header Type", VR::CS),
    private("SIEMENS CSA HEADER", 0x0029, 0x19, "CSASeriesHeaderVersion", "CSA Series Header Version", VR::LO),
    private("SIEMENS CSA HEADER", 0x0029, 0x20, "CSASeriesHeaderInfo", "CSA Series Header Info", VR::OB),
    private("GEMS_IDEN_01", 0x0009, 0x01, "FullFidelity", "Full Fidelity", VR::LO),
    private("GEMS_IDEN_01", 0x0009, 0x02, "SuiteID", "Suite ID", VR::SH),
    private("GEMS_IDEN_01", 0x0009, 0x04, "ProductID", "Product ID", VR::SH),
    private("GEMS_ACQU_01", 0x0019, 0x23, "TableSpeed", "Table Speed", VR::DS),
    private("PHILIPS MR IMAGING DD 001", 0x2005, 0x0D, "ScaleIntercept", "Scale Intercept", VR::FL),
    private("PHILIPS MR IMAGING DD 001", 0x2005, 0x0E, "ScaleSlope", "Scale Slope", VR::FL),
];

static INDEX: Lazy<HashMap<(&'static str, u16, u8), &'static DictionaryEntryRef<'static>>> =
    Lazy::new(|| {
        RECORDS
            .iter()
            .map(|r| ((r.creator, r.group, r.item), &r.entry))
            .collect()
    });

/// A dictionary of known vendor-specific attributes,
/// backed by the library's embedded private attribute table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StandardPrivateDictionary;

impl PrivateDictionary for StandardPrivateDictionary {
    fn by_creator(
        &self,
        creator: &str,
        group: u16,
        item: u8,
    ) -> Option<&DictionaryEntryRef<'static>> {
        let creator = creator.trim_end_matches(|c: char| c.is_whitespace() || c == '\0');
        INDEX.get(&(creator, group, item)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::StandardPrivateDictionary;
    use dcmkit_core::dictionary::{PrivateDictionary, VirtualVr};
    use dcmkit_core::VR;

    #[test]
    fn lookup_known_private_attributes() {
        let dict = StandardPrivateDictionary;
        let entry = dict
            .by_creator("SIEMENS CSA HEADER", 0x0029, 0x10)
            .unwrap();
        assert_eq!(entry.keyword, "CSAImageHeaderInfo");
        assert_eq!(entry.vr, VirtualVr::Exact(VR::OB));

        // creator strings are padded in the wild
        assert!(dict.by_creator("GEMS_IDEN_01 ", 0x0009, 0x02).is_some());
        assert!(dict.by_creator("NO SUCH VENDOR", 0x0009, 0x02).is_none());
        assert!(dict.by_creator("GEMS_IDEN_01", 0x0011, 0x02).is_none());
    }
}
