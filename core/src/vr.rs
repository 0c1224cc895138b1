//! The value representation code and its per-code metadata table.
//!
//! Unlike a closed enumeration, [`VR`] stores the two ASCII characters
//! of the code verbatim, so that a non-standard code found in the wild
//! survives a read/write round trip unchanged.
//! All coding decisions (header form, padding, delimiters)
//! go through the metadata table instead,
//! where unknown codes receive the profile of `UN`.

use std::fmt;
use std::str::FromStr;

/// A DICOM value representation:
/// two ASCII bytes packed into a 16-bit value, stored verbatim.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VR(u16);

macro_rules! decl_vrs {
    ($($code:ident),* $(,)?) => {
        impl VR {
            $(
                #[doc = concat!("The `", stringify!($code), "` value representation.")]
                pub const $code: VR = VR::from_chars(const_bytes(stringify!($code)));
            )*

            /// All value representations defined by the standard.
            pub const STANDARD: &'static [VR] = &[$(VR::$code),*];
        }
    };
}

const fn const_bytes(s: &str) -> [u8; 2] {
    let b = s.as_bytes();
    [b[0], b[1]]
}

decl_vrs! {
    AE, AS, AT, CS, DA, DS, DT, FL, FD, IS, LO, LT, OB, OD, OF, OL, OV, OW,
    PN, SH, SL, SQ, SS, ST, SV, TM, UC, UI, UL, UN, UR, US, UT, UV,
}

impl VR {
    /// Pack a value representation from its two ASCII characters.
    #[inline]
    pub const fn from_chars(chars: [u8; 2]) -> VR {
        VR(((chars[0] as u16) << 8) | chars[1] as u16)
    }

    /// Obtain the value representation corresponding to the given
    /// two bytes, exactly as found on the wire.
    #[inline]
    pub const fn from_binary(chars: [u8; 2]) -> VR {
        VR::from_chars(chars)
    }

    /// Retrieve a copy of this VR's byte representation.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 2] {
        [(self.0 >> 8) as u8, (self.0 & 0x00FF) as u8]
    }

    /// Whether this code is one of the value representations
    /// defined by the standard.
    pub fn is_standard(self) -> bool {
        VR::STANDARD.contains(&self)
    }

    /// Retrieve the metadata profile for this value representation.
    /// Codes not defined by the standard receive the `UN` profile.
    pub fn meta(self) -> &'static VrMeta {
        match self {
            VR::AE => &AE_META,
            VR::AS => &AS_META,
            VR::AT => &AT_META,
            VR::CS => &CS_META,
            VR::DA => &DA_META,
            VR::DS => &DS_META,
            VR::DT => &DT_META,
            VR::FL => &FL_META,
            VR::FD => &FD_META,
            VR::IS => &IS_META,
            VR::LO => &LO_META,
            VR::LT => &LT_META,
            VR::OB => &OB_META,
            VR::OD => &OD_META,
            VR::OF => &OF_META,
            VR::OL => &OL_META,
            VR::OV => &OV_META,
            VR::OW => &OW_META,
            VR::PN => &PN_META,
            VR::SH => &SH_META,
            VR::SL => &SL_META,
            VR::SQ => &SQ_META,
            VR::SS => &SS_META,
            VR::ST => &ST_META,
            VR::SV => &SV_META,
            VR::TM => &TM_META,
            VR::UC => &UC_META,
            VR::UI => &UI_META,
            VR::UL => &UL_META,
            VR::UR => &UR_META,
            VR::US => &US_META,
            VR::UT => &UT_META,
            VR::UV => &UV_META,
            _ => &UN_META,
        }
    }

    /// The descriptive name of this value representation,
    /// or "Unknown" for non-standard codes.
    pub fn name(self) -> &'static str {
        self.meta().name
    }

    /// The byte used to pad values of this VR to even length:
    /// space for text, NUL for identifiers and binary data.
    #[inline]
    pub fn padding(self) -> u8 {
        self.meta().padding
    }

    /// Whether values of this VR are character data
    /// subject to the data set's specific character set.
    #[inline]
    pub fn is_text(self) -> bool {
        self.meta().is_text
    }

    /// Whether the explicit-VR header of this VR uses the long form:
    /// two reserved bytes followed by a 32-bit length field.
    /// The short form uses a 16-bit length field.
    #[inline]
    pub fn is_long_form(self) -> bool {
        self.meta().long_form
    }

    /// Whether values of this VR may declare the undefined
    /// (delimited) length sentinel.
    #[inline]
    pub fn can_have_undefined_length(self) -> bool {
        self.meta().undefined_length
    }

    /// The byte separating individual values in a multi-valued
    /// element of this VR, if multi-valued encoding applies.
    #[inline]
    pub fn delimiter(self) -> Option<u8> {
        self.meta().delimiter
    }
}

impl fmt::Debug for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VR({self})")
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b] = self.to_bytes();
        if a.is_ascii_graphic() && b.is_ascii_graphic() {
            write!(f, "{}{}", a as char, b as char)
        } else {
            write!(f, "\\x{:02X}\\x{:02X}", a, b)
        }
    }
}

impl FromStr for VR {
    type Err = &'static str;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match *string.as_bytes() {
            [a, b] => Ok(VR::from_chars([a, b])),
            _ => Err("value representation code must be two bytes"),
        }
    }
}

/// Static encoding metadata for one value representation.
#[derive(Debug, Clone, PartialEq)]
pub struct VrMeta {
    /// Descriptive name from the standard.
    pub name: &'static str,
    /// Padding byte for values of odd length.
    pub padding: u8,
    /// Maximum length of a single value in bytes; 0 means unbounded.
    pub max_length: u32,
    /// Whether the value is character data.
    pub is_text: bool,
    /// Whether the explicit-VR header uses the 32-bit (long) form.
    pub long_form: bool,
    /// Whether the undefined length sentinel is acceptable.
    pub undefined_length: bool,
    /// Multi-value delimiter byte, if any.
    pub delimiter: Option<u8>,
}

const BACKSLASH: Option<u8> = Some(b'\\');

macro_rules! vr_meta {
    ($ident:ident, $name:literal, $pad:expr, $max:expr, $text:expr, $long:expr, $undef:expr, $delim:expr) => {
        static $ident: VrMeta = VrMeta {
            name: $name,
            padding: $pad,
            max_length: $max,
            is_text: $text,
            long_form: $long,
            undefined_length: $undef,
            delimiter: $delim,
        };
    };
}

vr_meta!(AE_META, "Application Entity", b' ', 16, true, false, false, BACKSLASH);
vr_meta!(AS_META, "Age String", b' ', 4, true, false, false, BACKSLASH);
vr_meta!(AT_META, "Attribute Tag", 0, 4, false, false, false, None);
vr_meta!(CS_META, "Code String", b' ', 16, true, false, false, BACKSLASH);
vr_meta!(DA_META, "Date", b' ', 8, true, false, false, BACKSLASH);
vr_meta!(DS_META, "Decimal String", b' ', 16, true, false, false, BACKSLASH);
vr_meta!(DT_META, "Date Time", b' ', 26, true, false, false, BACKSLASH);
vr_meta!(FL_META, "Floating Point Single", 0, 4, false, false, false, None);
vr_meta!(FD_META, "Floating Point Double", 0, 8, false, false, false, None);
vr_meta!(IS_META, "Integer String", b' ', 12, true, false, false, BACKSLASH);
vr_meta!(LO_META, "Long String", b' ', 64, true, false, false, BACKSLASH);
vr_meta!(LT_META, "Long Text", b' ', 10240, true, false, false, None);
vr_meta!(OB_META, "Other Byte", 0, 0, false, true, true, None);
vr_meta!(OD_META, "Other Double", 0, 0, false, true, false, None);
vr_meta!(OF_META, "Other Float", 0, 0, false, true, false, None);
vr_meta!(OL_META, "Other Long", 0, 0, false, true, false, None);
vr_meta!(OV_META, "Other Very Long", 0, 0, false, true, false, None);
vr_meta!(OW_META, "Other Word", 0, 0, false, true, true, None);
vr_meta!(PN_META, "Person Name", b' ', 324, true, false, false, BACKSLASH);
vr_meta!(SH_META, "Short String", b' ', 16, true, false, false, BACKSLASH);
vr_meta!(SL_META, "Signed Long", 0, 4, false, false, false, None);
vr_meta!(SQ_META, "Sequence of Items", 0, 0, false, true, true, None);
vr_meta!(SS_META, "Signed Short", 0, 2, false, false, false, None);
vr_meta!(ST_META, "Short Text", b' ', 1024, true, false, false, None);
vr_meta!(SV_META, "Signed 64-bit Very Long", 0, 8, false, true, false, None);
vr_meta!(TM_META, "Time", b' ', 14, true, false, false, BACKSLASH);
vr_meta!(UC_META, "Unlimited Characters", b' ', 0, true, true, false, BACKSLASH);
vr_meta!(UI_META, "Unique Identifier (UID)", 0, 64, true, false, false, BACKSLASH);
vr_meta!(UL_META, "Unsigned Long", 0, 4, false, false, false, None);
vr_meta!(UN_META, "Unknown", 0, 0, false, true, true, None);
vr_meta!(UR_META, "URI/URL", b' ', 0, true, true, false, None);
vr_meta!(US_META, "Unsigned Short", 0, 2, false, false, false, None);
vr_meta!(UT_META, "Unlimited Text", b' ', 0, true, true, false, None);
vr_meta!(UV_META, "Unsigned 64-bit Very Long", 0, 8, false, true, false, None);

#[cfg(test)]
mod tests {
    use super::VR;
    use std::str::FromStr;

    #[test]
    fn codes_round_trip_verbatim() {
        assert_eq!(VR::PN.to_bytes(), *b"PN");
        assert_eq!(VR::from_binary(*b"PN"), VR::PN);
        assert_eq!(VR::from_str("OB").unwrap(), VR::OB);
        assert_eq!(VR::OB.to_string(), "OB");

        // a non-standard code survives unchanged
        let odd = VR::from_binary(*b"ZZ");
        assert!(!odd.is_standard());
        assert_eq!(odd.to_bytes(), *b"ZZ");
        assert_eq!(odd.to_string(), "ZZ");
    }

    #[test]
    fn unknown_codes_get_un_profile() {
        let odd = VR::from_binary(*b"ZZ");
        assert!(odd.is_long_form());
        assert!(odd.can_have_undefined_length());
        assert_eq!(odd.name(), "Unknown");
    }

    #[test]
    fn header_forms() {
        // short form, 16-bit length
        for vr in [VR::AE, VR::CS, VR::DA, VR::PN, VR::UI, VR::US, VR::SS] {
            assert!(!vr.is_long_form(), "{} should be short form", vr);
        }
        // long form, reserved bytes plus 32-bit length
        for vr in [VR::OB, VR::OW, VR::SQ, VR::UN, VR::UC, VR::UR, VR::UT] {
            assert!(vr.is_long_form(), "{} should be long form", vr);
        }
        // 64-bit numeric representations use the long form
        for vr in [VR::SV, VR::UV, VR::OV, VR::OD] {
            assert!(vr.is_long_form(), "{} should be long form", vr);
        }
    }

    #[test]
    fn padding_bytes() {
        assert_eq!(VR::PN.padding(), b' ');
        assert_eq!(VR::LO.padding(), b' ');
        // identifiers and binary data pad with NUL
        assert_eq!(VR::UI.padding(), 0);
        assert_eq!(VR::OB.padding(), 0);
    }

    #[test]
    fn undefined_length_permissions() {
        assert!(VR::SQ.can_have_undefined_length());
        assert!(VR::OB.can_have_undefined_length());
        assert!(VR::UN.can_have_undefined_length());
        assert!(!VR::US.can_have_undefined_length());
        assert!(!VR::UI.can_have_undefined_length());
    }
}
