//! Well-known attribute keys, role names and rule names.
//!
//! These are the names persisted map files use. Typed relations stamp and
//! read them, format handlers map them onto their own grammar.

/// Attribute key holding the primitive or relation type.
pub const ATTR_TYPE: &str = "type";

/// Attribute key holding the subtype. For regulatory elements this is the
/// rule name used to look up the typed relation.
pub const ATTR_SUBTYPE: &str = "subtype";

/// Attribute key for the type of the primary signs of a traffic sign rule.
pub const ATTR_SIGN_TYPE: &str = "sign_type";

/// Attribute key for the type of the cancelling signs of a traffic sign rule.
pub const ATTR_CANCEL_TYPE: &str = "cancel_type";

/// Value of `type` on every regulatory element.
pub const REGULATORY_ELEMENT: &str = "regulatory_element";

/// Value of `type` on linestrings that represent a physical traffic sign.
pub const TRAFFIC_SIGN: &str = "traffic_sign";

/// Role holding the primitives a rule refers to (lights, signs).
pub const ROLE_REFERS: &str = "refers";

/// Role holding stop lines or lines from where a rule becomes valid.
pub const ROLE_REF_LINE: &str = "ref_line";

/// Role holding lanelets that have right of way.
pub const ROLE_RIGHT_OF_WAY: &str = "right_of_way";

/// Role holding lanelets that have to yield.
pub const ROLE_YIELD: &str = "yield";

/// Role holding signs that cancel a traffic sign rule.
pub const ROLE_CANCELS: &str = "cancels";

/// Role holding lines after which a traffic sign rule becomes invalid.
pub const ROLE_CANCEL_LINE: &str = "cancel_line";
