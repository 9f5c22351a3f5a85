//! Qualified element and attribute names used by the fill engine

/// WordprocessingML (`w:`) names
pub mod w {
    pub const BODY: &str = "w:body";
    pub const HEADER: &str = "w:hdr";
    pub const FOOTER: &str = "w:ftr";

    // Content controls
    pub const SDT: &str = "w:sdt";
    pub const SDT_PR: &str = "w:sdtPr";
    pub const SDT_CONTENT: &str = "w:sdtContent";
    pub const TAG: &str = "w:tag";

    // Block and run content
    pub const P: &str = "w:p";
    pub const P_PR: &str = "w:pPr";
    pub const P_STYLE: &str = "w:pStyle";
    pub const R: &str = "w:r";
    pub const R_PR: &str = "w:rPr";
    pub const T: &str = "w:t";
    pub const BR: &str = "w:br";
    pub const COLOR: &str = "w:color";
    pub const SZ: &str = "w:sz";
    pub const SZ_CS: &str = "w:szCs";
    pub const HIGHLIGHT: &str = "w:highlight";

    // Tables
    pub const TBL: &str = "w:tbl";
    pub const TR: &str = "w:tr";
    pub const TC: &str = "w:tc";
    pub const TC_PR: &str = "w:tcPr";
    pub const V_MERGE: &str = "w:vMerge";

    // Numbering
    pub const NUM_PR: &str = "w:numPr";
    pub const NUM_ID: &str = "w:numId";
    pub const ILVL: &str = "w:ilvl";
    pub const NUM: &str = "w:num";
    pub const ABSTRACT_NUM: &str = "w:abstractNum";
    pub const ABSTRACT_NUM_ID: &str = "w:abstractNumId";
    pub const NSID: &str = "w:nsid";
    pub const LVL: &str = "w:lvl";
    pub const LVL_OVERRIDE: &str = "w:lvlOverride";
    pub const START_OVERRIDE: &str = "w:startOverride";
    pub const START: &str = "w:start";
    pub const NUM_STYLE_LINK: &str = "w:numStyleLink";

    // Styles
    pub const STYLE: &str = "w:style";
    pub const STYLE_ID: &str = "w:styleId";
    pub const TYPE: &str = "w:type";

    /// The ubiquitous `w:val` attribute
    pub const VAL: &str = "w:val";
}

/// DrawingML (`a:`) names
pub mod a {
    pub const BLIP: &str = "a:blip";
}

/// Relationship (`r:`) attribute names
pub mod r {
    pub const EMBED: &str = "r:embed";
}

pub const XML_SPACE: &str = "xml:space";
