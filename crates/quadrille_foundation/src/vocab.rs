//! Well-known IRIs.

/// `rdf:type`
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
/// `rdf:langString`
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// `xsd:string`
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
/// `xsd:boolean`
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
/// `xsd:integer`
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
/// `xsd:int`
pub const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#int";
/// `xsd:long`
pub const XSD_LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
/// `xsd:decimal`
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
/// `xsd:double`
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
/// `xsd:float`
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";

/// Graph receiving quads inserted without an explicit graph.
pub const GRAPH_DEFAULT: &str = "urn:quadrille:graph:default";
/// Graph receiving conclusions of the rule engine unless configured otherwise.
pub const GRAPH_INFERENCE: &str = "urn:quadrille:graph:inference";
