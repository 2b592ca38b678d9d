//! Schemas shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use xmlschema_validator::documents::Element;
use xmlschema_validator::validators::{
    AttributeUse, BuiltinType, ComplexContent, ElementType, Facet, ModelType, Occurs,
    XsdAtomicType, XsdAttribute, XsdAttributeGroup, XsdComplexType, XsdElement, XsdGlobals,
    XsdGroup,
};

/// `person` with an `id` attribute and a sequence of `name`, `age` (0..=150)
/// and any number of `email`s.
pub fn person_schema() -> XsdGlobals {
    let mut globals = XsdGlobals::new();
    let context = Arc::clone(globals.context());

    let string = XsdAtomicType::builtin(BuiltinType::String, &context);
    let token = XsdAtomicType::builtin(BuiltinType::Token, &context);
    let age_type = Arc::new(
        XsdAtomicType::new(BuiltinType::Integer, &context)
            .with_name("ageType")
            .with_facet(Facet::MinInclusive(0.0))
            .with_facet(Facet::MaxInclusive(150.0)),
    );

    let name = XsdElement::with_type("name", ElementType::Simple(Arc::clone(&string)), &context);
    let age = XsdElement::with_type("age", ElementType::Simple(Arc::clone(&age_type)), &context);
    let email = XsdElement::with_type("email", ElementType::Simple(token), &context);
    let content = XsdGroup::new(ModelType::Sequence, &context)
        .with_particle(Arc::new(name), Occurs::once())
        .with_particle(Arc::new(age), Occurs::once())
        .with_particle(Arc::new(email), Occurs::zero_or_more());

    let attributes = XsdAttributeGroup::anonymous(&context)
        .with_attribute(Arc::new(
            XsdAttribute::new("id", string, &context).with_use(AttributeUse::Required),
        ))
        .expect("unique attribute");

    let person_type = XsdComplexType::new(&context)
        .with_name("personType")
        .with_attributes(Arc::new(attributes))
        .with_content(ComplexContent::Model(Arc::new(content)));

    globals.register_simple_type("ageType", age_type).expect("new type");
    globals
        .register_complex_type("personType", Arc::new(person_type))
        .expect("new type");
    globals
        .register_element(Arc::new(XsdElement::new("person", &context)))
        .expect("new element");
    globals
        .bind_element_type("person", "personType")
        .expect("unbound element");
    globals
}

/// Global `person` element of [`person_schema`]
pub fn person(globals: &XsdGlobals) -> Arc<XsdElement> {
    Arc::clone(globals.lookup_element("person").expect("person is declared"))
}

/// A `person` document
pub fn person_document(name: Option<&str>, age: &str, emails: &[&str]) -> Element {
    let mut person = Element::new("person").with_attribute("id", "p1");
    if let Some(name) = name {
        person = person.with_child(Element::new("name").with_text(name));
    }
    person = person.with_child(Element::new("age").with_text(age));
    for email in emails {
        person = person.with_child(Element::new("email").with_text(*email));
    }
    person
}

/// Two elements whose types contain each other: `a` holds an optional `b`,
/// `b` holds an optional `a`.
pub fn mutual_schema() -> XsdGlobals {
    let mut globals = XsdGlobals::new();
    let context = Arc::clone(globals.context());

    let a = Arc::new(XsdElement::new("a", &context));
    let b = Arc::new(XsdElement::new("b", &context));

    let a_type = XsdComplexType::new(&context).with_name("aType").with_content(ComplexContent::Model(
        Arc::new(XsdGroup::new(ModelType::Sequence, &context).with_particle(Arc::clone(&b), Occurs::optional())),
    ));
    let b_type = XsdComplexType::new(&context).with_name("bType").with_content(ComplexContent::Model(
        Arc::new(XsdGroup::new(ModelType::Sequence, &context).with_particle(Arc::clone(&a), Occurs::optional())),
    ));

    globals.register_complex_type("aType", Arc::new(a_type)).expect("new type");
    globals.register_complex_type("bType", Arc::new(b_type)).expect("new type");
    globals.register_element(a).expect("new element");
    globals.register_element(b).expect("new element");
    globals.bind_element_type("a", "aType").expect("unbound element");
    globals.bind_element_type("b", "bType").expect("unbound element");
    globals
}
