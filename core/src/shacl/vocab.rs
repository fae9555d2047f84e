// weaver/src/shacl/vocab.rs

//! SHACL vocabulary terms, as `oxrdf` constants.

use oxrdf::NamedNodeRef;

pub const SH: &str = "http://www.w3.org/ns/shacl#";

macro_rules! sh_terms {
  ($($name:ident => $local:literal),* $(,)?) => {
    $(pub const $name: NamedNodeRef<'static> =
      NamedNodeRef::new_unchecked(concat!("http://www.w3.org/ns/shacl#", $local));)*
  };
}

sh_terms! {
  NODE_SHAPE => "NodeShape",
  PROPERTY_SHAPE => "PropertyShape",
  VALIDATION_REPORT => "ValidationReport",
  VALIDATION_RESULT => "ValidationResult",

  TARGET_CLASS => "targetClass",
  TARGET_NODE => "targetNode",
  TARGET_SUBJECTS_OF => "targetSubjectsOf",
  TARGET_OBJECTS_OF => "targetObjectsOf",

  PROPERTY => "property",
  PATH => "path",
  INVERSE_PATH => "inversePath",
  ALTERNATIVE_PATH => "alternativePath",
  ZERO_OR_MORE_PATH => "zeroOrMorePath",
  ONE_OR_MORE_PATH => "oneOrMorePath",
  ZERO_OR_ONE_PATH => "zeroOrOnePath",

  SEVERITY => "severity",
  VIOLATION => "Violation",
  WARNING => "Warning",
  INFO => "Info",
  MESSAGE => "message",
  NAME => "name",
  DEACTIVATED => "deactivated",

  CLASS => "class",
  DATATYPE => "datatype",
  NODE_KIND => "nodeKind",
  MIN_COUNT => "minCount",
  MAX_COUNT => "maxCount",
  MIN_INCLUSIVE => "minInclusive",
  MAX_INCLUSIVE => "maxInclusive",
  MIN_EXCLUSIVE => "minExclusive",
  MAX_EXCLUSIVE => "maxExclusive",
  MIN_LENGTH => "minLength",
  MAX_LENGTH => "maxLength",
  PATTERN => "pattern",
  FLAGS => "flags",
  LANGUAGE_IN => "languageIn",
  UNIQUE_LANG => "uniqueLang",
  EQUALS => "equals",
  DISJOINT => "disjoint",
  LESS_THAN => "lessThan",
  LESS_THAN_OR_EQUALS => "lessThanOrEquals",
  IN => "in",
  HAS_VALUE => "hasValue",
  NODE => "node",
  NOT => "not",
  AND => "and",
  OR => "or",
  XONE => "xone",
  CLOSED => "closed",
  IGNORED_PROPERTIES => "ignoredProperties",

  IRI => "IRI",
  BLANK_NODE => "BlankNode",
  LITERAL => "Literal",
  BLANK_NODE_OR_IRI => "BlankNodeOrIRI",
  BLANK_NODE_OR_LITERAL => "BlankNodeOrLiteral",
  IRI_OR_LITERAL => "IRIOrLiteral",

  CONFORMS => "conforms",
  RESULT => "result",
  FOCUS_NODE => "focusNode",
  RESULT_PATH => "resultPath",
  VALUE => "value",
  RESULT_MESSAGE => "resultMessage",
  RESULT_SEVERITY => "resultSeverity",
  SOURCE_SHAPE => "sourceShape",
  SOURCE_CONSTRAINT_COMPONENT => "sourceConstraintComponent",
}
