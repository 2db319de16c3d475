use crate::unit_segment;
use teal::fields::{ElementFields, FieldAccessor};
use teal::variable::{Coupled, VariableId, VariableRegistry};

#[test]
fn registry_assigns_consecutive_ids() {
    let mut registry = VariableRegistry::new();
    assert!(registry.is_empty());
    let temperature = registry.register("temperature");
    let density = registry.register("density");
    assert_eq!(temperature, VariableId(0));
    assert_eq!(density, VariableId(1));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.name(density), Some("density"));
    assert_eq!(registry.name(VariableId(7)), None);
}

#[test]
fn registering_twice_returns_same_id() {
    let mut registry = VariableRegistry::new();
    let first = registry.register("porosity");
    let second = registry.register(String::from("porosity"));
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
}

#[test]
fn lookup_of_unknown_variable_fails() {
    let mut registry = VariableRegistry::new();
    registry.register("temperature");
    assert_eq!(registry.lookup("temperature").unwrap(), VariableId(0));
    let error = registry.lookup("pressure").unwrap_err();
    assert!(error.to_string().contains("pressure"));
}

#[test]
fn coupled_inputs_read_constants_and_fields() {
    let element = unit_segment();
    let velocity = VariableId(3);
    let fields = ElementFields::from_nodal_values(element.trial(), &[1.0, 2.0])
        .with_coupled_nodal_values(velocity, element.trial(), &[4.0, 4.0]);

    let constant = Coupled::Constant(2.5);
    let variable = Coupled::Variable(velocity);
    for qp in 0..fields.num_quadrature_points() {
        assert_eq!(constant.value(&fields, qp), 2.5);
        assert!((variable.value(&fields, qp) - 4.0).abs() < 1e-14);
    }

    assert!(variable.is(velocity));
    assert!(!variable.is(VariableId(0)));
    assert!(!constant.is(velocity));
    assert_eq!(variable.variable(), Some(velocity));
    assert_eq!(Coupled::<f64>::from(velocity), variable);
    assert_eq!(Coupled::<f64>::one(), Coupled::Constant(1.0));
}

#[test]
fn element_fields_interpolate_primary_unknown() {
    let element = unit_segment();
    let fields = ElementFields::from_nodal_values(element.trial(), &[300.0, 310.0])
        .with_time_derivative(element.trial(), &[1.0, 3.0], 10.0);

    assert_eq!(fields.nodal_u(), &[300.0, 310.0]);
    assert_eq!(fields.du_dot_du(), 10.0);
    let average: f64 = (0..2).map(|qp| fields.u(qp)).sum::<f64>() / 2.0;
    assert!((average - 305.0).abs() < 1e-12);
    for qp in 0..2 {
        assert!((fields.grad_u(qp).x - 10.0).abs() < 1e-12);
        assert!(fields.u_dot(qp) > 1.0 && fields.u_dot(qp) < 3.0);
    }
    assert!(!fields.has_coupled(VariableId(0)));
}

#[test]
#[should_panic]
fn coupled_values_must_match_quadrature_points() {
    let element = unit_segment();
    let _ = ElementFields::from_nodal_values(element.trial(), &[0.0, 0.0]).with_coupled_values(VariableId(0), vec![1.0]);
}
