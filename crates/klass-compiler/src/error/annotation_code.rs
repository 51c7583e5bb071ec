//! Annotation codes for the Klass diagnostic system.
//!
//! Codes are stable, searchable identifiers of the form `ERR_XXX_YYY` for
//! errors and `WRN_XXX_YYY` for warnings. They are grouped by the
//! construct they describe:
//! - `ERR_LEX_*` / `ERR_SYN_*` - Lexer and parser errors
//! - Top-level names and declarations
//! - Enumerations, classifiers, inheritance
//! - Temporal and audit properties
//! - Associations, criteria, projections and services

use std::fmt;

use crate::error::Severity;

macro_rules! annotation_codes {
    ($(
        $(#[$doc:meta])*
        $variant:ident => $code:literal, $description:literal;
    )*) => {
        /// Codes for categorizing diagnostics.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum AnnotationCode {
            $(
                $(#[$doc])*
                $variant,
            )*
        }

        impl AnnotationCode {
            /// Every code, in catalogue order.
            pub const ALL: &'static [AnnotationCode] = &[$(AnnotationCode::$variant,)*];

            /// Returns the code as a string (e.g., "ERR_DUP_TOP").
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(AnnotationCode::$variant => $code,)*
                }
            }

            /// Returns a short description of what this code means.
            pub fn description(&self) -> &'static str {
                match self {
                    $(AnnotationCode::$variant => $description,)*
                }
            }
        }
    };
}

annotation_codes! {
    // =========================================================================
    // Lexer and parser
    // =========================================================================
    /// A character that cannot start any token.
    ErrLexChr => "ERR_LEX_CHR", "unexpected character";
    /// A string literal that is not closed before the end of the line.
    ErrLexStr => "ERR_LEX_STR", "unterminated string literal";
    /// An unrecognized escape sequence in a string literal.
    ErrLexEsc => "ERR_LEX_ESC", "invalid escape sequence";
    /// A numeric literal that does not fit its type.
    ErrLexNum => "ERR_LEX_NUM", "invalid number literal";
    /// The parser met a token it did not expect.
    ErrSynTok => "ERR_SYN_TOK", "unexpected token";
    /// The input ended before a complete declaration was parsed.
    ErrSynEof => "ERR_SYN_EOF", "unexpected end of input";

    // =========================================================================
    // Top level and names
    // =========================================================================
    /// A top-level element is declared more than once.
    ErrDupTop => "ERR_DUP_TOP", "duplicate top-level element";
    /// A package name segment is not lower case.
    ErrPkgNme => "ERR_PKG_NME", "invalid package name";
    /// A top-level element name does not match `[A-Z][A-Za-z0-9]*`.
    ErrTopNme => "ERR_TOP_NME", "invalid top-level name";
    /// A member or parameter name does not match `[a-z][A-Za-z0-9]*`.
    ErrMemNme => "ERR_MEM_NME", "invalid member name";
    /// An association end name does not match `[a-z][A-Za-z0-9]*`.
    ErrEndNme => "ERR_END_NME", "invalid association end name";
    /// An enumeration literal does not match `[A-Z][A-Z0-9_]*`.
    ErrLitNme => "ERR_LIT_NME", "invalid enumeration literal name";
    /// A declaration refers to a classifier declared later in the same unit.
    ErrFwdRef => "ERR_FWD_REF", "forward reference";

    // =========================================================================
    // Enumerations
    // =========================================================================
    /// Two literals of an enumeration share a name.
    ErrDupLit => "ERR_DUP_LIT", "duplicate enumeration literal";
    /// Two literals of an enumeration share a pretty name.
    ErrDupPrt => "ERR_DUP_PRT", "duplicate enumeration pretty name";

    // =========================================================================
    // Classifiers
    // =========================================================================
    /// A data type property's type is neither primitive nor an enumeration.
    ErrPrpTyp => "ERR_PRP_TYP", "unknown property type";
    /// Two members of a classifier share a name.
    ErrDupMem => "ERR_DUP_MEM", "duplicate member";
    /// A validation is given twice on one property.
    ErrDupVal => "ERR_DUP_VAL", "duplicate validation";
    /// A validation does not apply to the property's type.
    ErrValDtp => "ERR_VAL_DTP", "validation does not apply to type";
    /// A validation bound is negative or inverted.
    ErrValRng => "ERR_VAL_RNG", "invalid validation range";
    /// A class has no key properties.
    ErrClsKey => "ERR_CLS_KEY", "class has no key";
    /// A class mixes id properties with non-id key properties.
    ErrKeyIds => "ERR_KEY_IDS", "id and non-id keys mixed";
    /// A transient class declares an id property.
    ErrTnsIdp => "ERR_TNS_IDP", "transient class with id property";
    /// A modifier is repeated.
    ErrDupMod => "ERR_DUP_MOD", "duplicate modifier";
    /// A `version` property is not an integral number.
    ErrVerDtp => "ERR_VER_DTP", "invalid version property type";
    /// A `userId` property is not a string.
    ErrUsrDtp => "ERR_USR_DTP", "invalid user id property type";
    /// More than one user class is declared.
    ErrDupUsr => "ERR_DUP_USR", "duplicate user class";
    /// A version class is itself versioned.
    ErrVerVer => "ERR_VER_VER", "version class is versioned";
    /// A private property is never referenced.
    WrnPrvUnr => "WRN_PRV_UNR", "unreferenced private property";

    // =========================================================================
    // Inheritance
    // =========================================================================
    /// A superclass is missing, or an interface uses `extends`.
    ErrExtCls => "ERR_EXT_CLS", "invalid superclass";
    /// A class extends an interface.
    ErrExtInt => "ERR_EXT_INT", "class extends interface";
    /// An implemented name is not an interface.
    ErrImpInt => "ERR_IMP_INT", "invalid implemented interface";
    /// An interface is listed twice.
    ErrDupInt => "ERR_DUP_INT", "duplicate interface";
    /// An interface is already inherited another way.
    ErrRedInt => "ERR_RED_INT", "redundant interface";
    /// A classifier inherits from itself.
    ErrCycInh => "ERR_CYC_INH", "circular inheritance";

    // =========================================================================
    // Temporal properties
    // =========================================================================
    /// A temporal range property is not a `TemporalRange`.
    ErrTmpRng => "ERR_TMP_RNG", "invalid temporal range type";
    /// A temporal bound property is not a `TemporalInstant`.
    ErrTmpIns => "ERR_TMP_INS", "invalid temporal instant type";
    /// `from`/`to` is used without `system` or `valid`.
    ErrTmpSys => "ERR_TMP_SYS", "temporal bound without dimension";
    /// A property is both `from` and `to`.
    ErrTmpFto => "ERR_TMP_FTO", "temporal property is from and to";

    // =========================================================================
    // Audit properties
    // =========================================================================
    /// Audit information is requested but no user id property exists.
    ErrAudUid => "ERR_AUD_UID", "missing user id";
    /// A `userId` property is not a key.
    ErrAudKey => "ERR_AUD_KEY", "user id is not a key";
    /// An audit property has the wrong type.
    ErrAudDtp => "ERR_AUD_DTP", "invalid audit property type";
    /// A `createdBy`/`lastUpdatedBy` property is not private.
    ErrAudPri => "ERR_AUD_PRI", "audit property is not private";
    /// A `createdOn` property is not final.
    ErrConFin => "ERR_CON_FIN", "createdOn property is not final";
    /// A `createdBy` property is not named `createdById`.
    WrnCrtNam => "WRN_CRT_NAM", "unconventional createdBy name";
    /// A `lastUpdatedBy` property is not named `lastUpdatedById`.
    WrnLubNam => "WRN_LUB_NAM", "unconventional lastUpdatedBy name";

    // =========================================================================
    // Associations
    // =========================================================================
    /// An association does not have exactly two ends.
    ErrAsoEnd => "ERR_ASO_END", "association must have two ends";
    /// A reference type is missing or not a class.
    ErrRefTyp => "ERR_REF_TYP", "invalid reference type";
    /// A multiplicity is not one of `[0..1]`, `[1..1]`, `[0..*]`, `[1..*]`.
    ErrAsoMul => "ERR_ASO_MUL", "invalid multiplicity";
    /// A to-one reference has an order-by clause.
    ErrRefOrd => "ERR_REF_ORD", "order-by on to-one reference";
    /// An optional foreign key backs a required to-one end.
    ErrForMul => "ERR_FOR_MUL", "foreign key optionality mismatch";
    /// A required foreign key backs an optional to-one end.
    WrnForMul => "WRN_FOR_MUL", "foreign key optionality mismatch";
    /// A foreign key and its association end disagree on `final`.
    ErrForFin => "ERR_FOR_FIN", "foreign key finality mismatch";
    /// A relationship joins no foreign key to a key.
    ErrRelFky => "ERR_REL_FKY", "relationship has no foreign key";

    // =========================================================================
    // Criteria and values
    // =========================================================================
    /// A member path names a property that does not exist.
    ErrMemTyp => "ERR_MEM_TYP", "unknown member";
    /// A member path starts with a type that does not exist.
    ErrTypMem => "ERR_TYP_MEM", "unknown type in member path";
    /// A member path segment is not an association end.
    ErrPthEnd => "ERR_PTH_END", "unknown association end in path";
    /// A variable does not name a parameter in scope.
    ErrVarRef => "ERR_VAR_REF", "unknown variable";
    /// Operands of an operator have no type in common.
    ErrOprTyp => "ERR_OPR_TYP", "incompatible operand types";
    /// The right side of `in` is not a list.
    ErrOprIn => "ERR_OPR_IN", "invalid `in` operand";
    /// `equalsEdgePoint` applied to a non-range property.
    ErrEdgPnt => "ERR_EDG_PNT", "invalid edge point";
    /// `user` used without a user class.
    ErrUsrLit => "ERR_USR_LIT", "no user class";

    // =========================================================================
    // Projections
    // =========================================================================
    /// A projection's `on` type is missing or not a classifier.
    ErrPrjTyp => "ERR_PRJ_TYP", "unknown projection type";
    /// Two members of a projection share a name.
    ErrDupPrj => "ERR_DUP_PRJ", "duplicate projection member";
    /// A projection member names nothing on its classifier.
    ErrPaeNfd => "ERR_PAE_NFD", "projection member not found";
    /// A projection member is inherited from more than one classifier.
    ErrPaeAmb => "ERR_PAE_AMB", "ambiguous projection member";
    /// A projection member's shape does not fit what it names.
    ErrPrjDtp => "ERR_PRJ_DTP", "projection member kind mismatch";
    /// A referenced projection is on the wrong classifier.
    ErrPrrKls => "ERR_PRR_KLS", "projection reference type mismatch";
    /// A referenced projection does not exist.
    ErrPrjRef => "ERR_PRJ_REF", "unknown projection reference";

    // =========================================================================
    // Services
    // =========================================================================
    /// A service group's class does not exist.
    ErrSrgTyp => "ERR_SRG_TYP", "unknown service class";
    /// A service group has no URLs.
    ErrSerEmp => "ERR_SER_EMP", "empty service group";
    /// More than one service group serves a class.
    ErrDupSvc => "ERR_DUP_SVC", "duplicate service group";
    /// A URL pattern is declared twice.
    ErrDupUrl => "ERR_DUP_URL", "duplicate URL";
    /// A verb is declared twice on a URL.
    ErrDupVrb => "ERR_DUP_VRB", "duplicate verb";
    /// A URL declares a parameter name twice.
    ErrDupPar => "ERR_DUP_PAR", "duplicate URL parameter";
    /// A parameter's type is unknown.
    ErrParTyp => "ERR_PAR_TYP", "unknown parameter type";
    /// A criteria keyword is declared twice on a service.
    ErrDupCri => "ERR_DUP_CRI", "duplicate service criteria";
    /// A criteria keyword is not allowed for the service's verb.
    ErrVrbCrt => "ERR_VRB_CRT", "criteria not allowed for verb";
    /// A service projection is missing or on the wrong class.
    ErrSerPrj => "ERR_SER_PRJ", "invalid service projection";
    /// A service multiplicity does not fit the verb.
    ErrSerMul => "ERR_SER_MUL", "invalid service multiplicity";
}

impl AnnotationCode {
    /// Severity implied by the code prefix.
    pub fn severity(&self) -> Severity {
        if self.as_str().starts_with("WRN_") {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

impl fmt::Display for AnnotationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_annotation_code_display() {
        assert_eq!(AnnotationCode::ErrDupTop.to_string(), "ERR_DUP_TOP");
        assert_eq!(AnnotationCode::WrnPrvUnr.to_string(), "WRN_PRV_UNR");
    }

    #[test]
    fn test_annotation_code_description() {
        assert_eq!(
            AnnotationCode::ErrDupTop.description(),
            "duplicate top-level element"
        );
        assert_eq!(
            AnnotationCode::ErrLexStr.description(),
            "unterminated string literal"
        );
    }

    #[test]
    fn test_codes_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for code in AnnotationCode::ALL {
            let text = code.as_str();
            assert!(seen.insert(text), "duplicate code {text}");
            let parts: Vec<&str> = text.split('_').collect();
            let upper = |part: &str| part.chars().all(|c| c.is_ascii_uppercase());
            assert!(
                matches!(parts.as_slice(), [prefix, group, detail]
                    if matches!(*prefix, "ERR" | "WRN")
                        && group.len() == 3
                        && upper(*group)
                        && (2..=3).contains(&detail.len())
                        && upper(*detail)),
                "malformed code {text}"
            );
        }
    }

    #[test]
    fn test_short_detail_code() {
        assert_eq!(AnnotationCode::ErrOprIn.to_string(), "ERR_OPR_IN");
        assert!(AnnotationCode::ErrOprIn.severity().is_error());
    }

    #[test]
    fn test_severity_follows_prefix() {
        assert!(AnnotationCode::ErrCycInh.severity().is_error());
        assert!(AnnotationCode::WrnForMul.severity().is_warning());
        assert!(AnnotationCode::WrnCrtNam.severity().is_warning());
    }
}
