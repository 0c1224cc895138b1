//! Resolution of context-dependent value representations.
//!
//! Under Implicit VR, and for a handful of attributes even under
//! Explicit VR, the effective value representation depends on the
//! surrounding data set: the pixel sample description decides
//! between `OB` and `OW`, the pixel representation decides between
//! `US` and `SS`, and LUT data widens to `OW` past 256 entries.
//!
//! Context values are looked up through the parent chain of the
//! data set being built. When a deciding attribute has not been
//! parsed by the time it is needed, the resolution falls back to
//! `UN` and the ambiguity is flagged for reporting.

use dcmkit_core::dictionary::{DictionaryEntryRef, VirtualVr};
use dcmkit_core::{Length, Tag, VR};

/// The context values a resolution may need,
/// already looked up through the parent chain.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct VrContext {
    /// _Bits Allocated_ (0028,0100), if parsed by now.
    pub bits_allocated: Option<u16>,
    /// _Pixel Representation_ (0028,0103), if parsed by now.
    pub pixel_representation: Option<u16>,
}

/// The outcome of a VR resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedVr {
    /// The effective value representation.
    pub vr: VR,
    /// Whether the resolution had to give up for lack of context,
    /// worth an informational note in the parse report.
    pub ambiguous: bool,
}

impl ResolvedVr {
    fn exact(vr: VR) -> Self {
        ResolvedVr {
            vr,
            ambiguous: false,
        }
    }

    fn unresolved() -> Self {
        ResolvedVr {
            vr: VR::UN,
            ambiguous: true,
        }
    }
}

/// Whether the tag is one of the pixel data attributes
/// subject to the encapsulation/bit depth rule.
fn is_pixel_data(tag: Tag) -> bool {
    matches!(tag, Tag(0x7FE0, 0x0008) | Tag(0x7FE0, 0x0009) | Tag(0x7FE0, 0x0010))
}

/// Resolve the effective value representation of an element
/// with no VR on the wire.
///
/// - An entry with an exact VR wins immediately.
/// - Pixel data resolves to `OB` under an encapsulating transfer
///   syntax, otherwise by _Bits Allocated_ (`OW` above 8).
/// - `US`/`SS` alternatives resolve by _Pixel Representation_.
/// - `US`/`OW` LUT data resolves by the declared length
///   (`OW` when the table exceeds 256 16-bit entries).
/// - Unknown tags resolve to `UN`.
pub fn resolve_vr(
    tag: Tag,
    entry: Option<&DictionaryEntryRef<'_>>,
    declared_len: Length,
    ctx: VrContext,
    encapsulated: bool,
) -> ResolvedVr {
    let Some(entry) = entry else {
        return ResolvedVr::exact(VR::UN);
    };

    if let Some(vr) = entry.vr.exact() {
        return ResolvedVr::exact(vr);
    }

    match entry.vr {
        VirtualVr::Px => {
            if encapsulated {
                return ResolvedVr::exact(VR::OB);
            }
            match ctx.bits_allocated {
                Some(bits) if bits > 8 => ResolvedVr::exact(VR::OW),
                Some(_) => ResolvedVr::exact(VR::OB),
                None if is_pixel_data(tag) => ResolvedVr::unresolved(),
                None => ResolvedVr::exact(VR::OW),
            }
        }
        VirtualVr::Ox => match ctx.bits_allocated {
            Some(bits) if bits > 8 => ResolvedVr::exact(VR::OW),
            Some(_) => ResolvedVr::exact(VR::OB),
            None => ResolvedVr::exact(VR::OW),
        },
        VirtualVr::Xs => match ctx.pixel_representation {
            Some(1) => ResolvedVr::exact(VR::SS),
            Some(_) => ResolvedVr::exact(VR::US),
            None => ResolvedVr::unresolved(),
        },
        VirtualVr::Lt => match declared_len.get() {
            Some(len) if len > 256 * 2 => ResolvedVr::exact(VR::OW),
            _ => ResolvedVr::exact(VR::US),
        },
        VirtualVr::Exact(_) => unreachable!("exact VR handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmkit_core::dictionary::DataDictionary;
    use dcmkit_dictionary_std::StandardDataDictionary;

    static DICT: StandardDataDictionary = StandardDataDictionary;

    fn entry(tag: Tag) -> Option<&'static DictionaryEntryRef<'static>> {
        DICT.by_tag(tag)
    }

    #[test]
    fn exact_entries_win() {
        let r = resolve_vr(
            Tag(0x0010, 0x0010),
            entry(Tag(0x0010, 0x0010)),
            Length(8),
            VrContext::default(),
            false,
        );
        assert_eq!(r.vr, VR::PN);
        assert!(!r.ambiguous);
    }

    #[test]
    fn pixel_data_resolution() {
        let tag = Tag(0x7FE0, 0x0010);
        // encapsulated pixel data is always OB
        let r = resolve_vr(tag, entry(tag), Length::UNDEFINED, VrContext::default(), true);
        assert_eq!(r.vr, VR::OB);

        // native: by Bits Allocated
        let ctx = VrContext {
            bits_allocated: Some(16),
            ..Default::default()
        };
        assert_eq!(resolve_vr(tag, entry(tag), Length(16), ctx, false).vr, VR::OW);
        let ctx = VrContext {
            bits_allocated: Some(8),
            ..Default::default()
        };
        assert_eq!(resolve_vr(tag, entry(tag), Length(16), ctx, false).vr, VR::OB);

        // missing context cannot be resolved
        let r = resolve_vr(tag, entry(tag), Length(16), VrContext::default(), false);
        assert_eq!(r.vr, VR::UN);
        assert!(r.ambiguous);
    }

    #[test]
    fn us_ss_resolution() {
        let tag = Tag(0x0028, 0x0106);
        let signed = VrContext {
            pixel_representation: Some(1),
            ..Default::default()
        };
        assert_eq!(resolve_vr(tag, entry(tag), Length(2), signed, false).vr, VR::SS);
        let unsigned = VrContext {
            pixel_representation: Some(0),
            ..Default::default()
        };
        assert_eq!(
            resolve_vr(tag, entry(tag), Length(2), unsigned, false).vr,
            VR::US
        );
        let r = resolve_vr(tag, entry(tag), Length(2), VrContext::default(), false);
        assert!(r.ambiguous);
    }

    #[test]
    fn lut_data_resolution() {
        let tag = Tag(0x0028, 0x3006);
        let ctx = VrContext::default();
        assert_eq!(resolve_vr(tag, entry(tag), Length(512), ctx, false).vr, VR::US);
        assert_eq!(resolve_vr(tag, entry(tag), Length(514), ctx, false).vr, VR::OW);
    }

    #[test]
    fn unknown_tags_resolve_to_un() {
        let tag = Tag(0x0011, 0x1001);
        let r = resolve_vr(tag, None, Length(4), VrContext::default(), false);
        assert_eq!(r.vr, VR::UN);
        assert!(!r.ambiguous);
    }
}
