//! Schema check pass tests: validity tracking across generations and cycles.

mod fixtures;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use xmlschema_validator::documents::Element;
use xmlschema_validator::validators::{
    check_report, BuiltinType, CheckContext, ComplexContent, ElementType, Facet, ModelType,
    Occurs, ValidationStatus, ValidityStatus, XsdAtomicType, XsdComplexType, XsdComponent,
    XsdElement, XsdGlobals, XsdGroup, XsdValidator,
};

use fixtures::{mutual_schema, person, person_schema};

#[test]
fn test_circular_schema_check_terminates() {
    let globals = mutual_schema();
    let report = globals.check_schema().unwrap();
    assert!(report.is_valid());

    for name in ["a", "b"] {
        let element = globals.lookup_element(name).unwrap();
        assert!(element.checked().unwrap());
        assert_eq!(element.validity().unwrap(), ValidityStatus::Valid);
        assert_eq!(element.validation_attempted().unwrap(), ValidationStatus::Full);
    }
}

#[test]
fn test_circular_schema_decodes_nested_data() {
    let globals = mutual_schema();
    let a = globals.lookup_element("a").unwrap();
    let data = Element::new("a").with_child(Element::new("b").with_child(Element::new("a")));

    assert_eq!(a.decode(&data).unwrap(), json!({"b": {"a": {}}}));
    assert_eq!(a.encode(&json!({"b": {"a": {}}})).unwrap(), data);

    let wrong = Element::new("a").with_child(Element::new("a"));
    assert!(!a.is_valid(&wrong).unwrap());
}

#[test]
fn test_records_go_stale_on_new_generation() {
    let globals = person_schema();
    let person = person(&globals);
    assert_eq!(person.valid().unwrap(), None);

    globals.check_schema().unwrap();
    assert_eq!(person.valid().unwrap(), Some(true));

    globals.context().advance();
    assert!(!person.checked().unwrap());
    assert_eq!(person.validity().unwrap(), ValidityStatus::NotKnown);
    assert_eq!(person.validation_attempted().unwrap(), ValidationStatus::None);

    globals.check_schema().unwrap();
    assert_eq!(person.validity().unwrap(), ValidityStatus::Valid);
}

#[test]
fn test_invalid_component_propagates() {
    let mut globals = XsdGlobals::new();
    let context = Arc::clone(globals.context());
    let broken = XsdAtomicType::new(BuiltinType::Integer, &context)
        .with_facet(Facet::MinInclusive(10.0))
        .with_facet(Facet::MaxInclusive(1.0));
    let element = Arc::new(XsdElement::with_type(
        "n",
        ElementType::Simple(Arc::new(broken)),
        &context,
    ));
    globals.register_element(Arc::clone(&element)).unwrap();

    let report = globals.check_schema().unwrap();
    assert_eq!(report.validity, ValidityStatus::Invalid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(element.valid().unwrap(), Some(false));
    assert_eq!(globals.valid().unwrap(), Some(false));
}

#[test]
fn test_check_is_idempotent_within_generation() {
    let context = CheckContext::shared();
    let string = XsdAtomicType::builtin(BuiltinType::String, &context);

    let first = check_report(string.as_ref()).unwrap();
    let second = check_report(string.as_ref()).unwrap();
    assert_eq!(first.validity, second.validity);
    assert_eq!(string.tracker().last_checked(), Some(context.current()));

    string.check().unwrap();
    assert_eq!(string.valid().unwrap(), Some(true));
}

#[test]
fn test_invalid_element_on_cycle_invalidates_its_containers() {
    let context = CheckContext::shared();
    let a = Arc::new(XsdElement::new("a", &context).with_default("x").with_fixed("y"));
    let group = Arc::new(
        XsdGroup::new(ModelType::Sequence, &context).with_particle(Arc::clone(&a), Occurs::optional()),
    );
    let a_type = Arc::new(XsdComplexType::new(&context).with_content(ComplexContent::Model(Arc::clone(&group))));
    a.bind_type(ElementType::Complex(Arc::clone(&a_type))).unwrap();

    let report = check_report(a.as_ref()).unwrap();
    assert_eq!(report.validity, ValidityStatus::Invalid);
    assert!(!report.errors.is_empty());
    assert_eq!(a.validity().unwrap(), ValidityStatus::Invalid);
    assert_eq!(a_type.validity().unwrap(), ValidityStatus::Invalid);
    assert_eq!(group.validity().unwrap(), ValidityStatus::Invalid);
}
