use crate::{
    assert_jacobian_matches_finite_difference, assert_off_diagonal_matches_finite_difference, local_jacobian,
    local_off_diagonal_jacobian, local_residual, NodalState,
};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector, U1, U2};
use teal::bcs::ThermalFluidFluxBC;
use teal::element::{CoordinateSystem, ElementValues, Quad4Element, ReferenceElement, Segment2Element};
use teal::kernel::Kernel;
use teal::variable::{Coupled, VariableId};

const VX: VariableId = VariableId(1);
const VY: VariableId = VariableId(2);
const OUTSIDE_TEMPERATURE: VariableId = VariableId(3);
const DENSITY: VariableId = VariableId(4);
const HEAT_CAPACITY: VariableId = VariableId(5);
const VOLUME_FRACTION: VariableId = VariableId(6);

fn segment_facet(facet: usize) -> ElementValues<f64, U1> {
    Segment2Element::from_interval([0.0, 1.0])
        .facet_values(facet, 1, CoordinateSystem::Cartesian)
        .unwrap()
}

fn square_facet(facet: usize) -> ElementValues<f64, U2> {
    Quad4Element::rectangle([0.0, 1.0], [0.0, 1.0])
        .facet_values(facet, 2, CoordinateSystem::Cartesian)
        .unwrap()
}

fn flux_bc(vx: f64, outside_temperature: f64) -> ThermalFluidFluxBC<f64> {
    ThermalFluidFluxBC::new(
        Coupled::one(),
        Coupled::one(),
        [Coupled::Constant(vx), Coupled::zero(), Coupled::zero()],
        Coupled::Constant(outside_temperature),
    )
}

fn coupled_bc() -> ThermalFluidFluxBC<f64> {
    ThermalFluidFluxBC::new(
        Coupled::Variable(DENSITY),
        Coupled::Variable(HEAT_CAPACITY),
        [Coupled::Variable(VX), Coupled::Variable(VY), Coupled::zero()],
        Coupled::Variable(OUTSIDE_TEMPERATURE),
    )
    .with_volume_fraction(Coupled::Variable(VOLUME_FRACTION))
}

fn coupled_state(vx: [f64; 4]) -> NodalState {
    NodalState::new(&[300.0, 320.0, 310.0, 290.0])
        .with_coupled(VX, &vx)
        .with_coupled(VY, &[0.1, -0.2, 0.3, 0.2])
        .with_coupled(OUTSIDE_TEMPERATURE, &[280.0, 285.0, 290.0, 295.0])
        .with_coupled(DENSITY, &[1000.0, 990.0, 980.0, 1010.0])
        .with_coupled(HEAT_CAPACITY, &[4.2, 4.1, 4.0, 4.3])
        .with_coupled(VOLUME_FRACTION, &[0.3, 0.4, 0.5, 0.6])
}

#[test]
fn outflow_carries_domain_temperature() {
    let facet = segment_facet(1);
    let fields = NodalState::new(&[300.0, 310.0]).fields(&facet);
    let bc = flux_bc(1.0, 250.0);

    let residual = local_residual(&bc, &facet, &fields);
    assert_matrix_eq!(residual, DVector::from_column_slice(&[0.0, 310.0]), comp = abs, tol = 1e-12);

    let jacobian = local_jacobian(&bc, &facet, &fields);
    let expected = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]);
    assert_matrix_eq!(jacobian, expected, comp = abs, tol = 1e-14);
}

#[test]
fn inflow_carries_outside_temperature() {
    let facet = segment_facet(0);
    let fields = NodalState::new(&[300.0, 310.0]).fields(&facet);
    let bc = flux_bc(1.0, 250.0);

    let residual = local_residual(&bc, &facet, &fields);
    assert_matrix_eq!(residual, DVector::from_column_slice(&[-250.0, 0.0]), comp = abs, tol = 1e-12);
    assert_eq!(local_jacobian(&bc, &facet, &fields), DMatrix::zeros(2, 2));
}

#[test]
fn tangential_flow_has_no_flux() {
    let facet = square_facet(0);
    let fields = NodalState::new(&[300.0, 320.0, 310.0, 290.0]).fields(&facet);
    let bc = flux_bc(3.0, 250.0);
    let residual = local_residual(&bc, &facet, &fields);
    assert!(residual.iter().all(|r| *r == 0.0));
}

#[test]
fn outflow_derivatives_match_finite_differences() {
    // Facet 1 is the right edge, where positive x-velocity leaves the domain
    let facet = square_facet(1);
    let state = coupled_state([1.0, 1.5, 0.5, 0.8]);
    let bc = coupled_bc();

    assert_jacobian_matches_finite_difference(&bc, &facet, &state);
    for jvar in [VX, VY, DENSITY, HEAT_CAPACITY, VOLUME_FRACTION, OUTSIDE_TEMPERATURE] {
        assert_off_diagonal_matches_finite_difference(&bc, &facet, &state, jvar);
    }

    let outside = local_off_diagonal_jacobian(&bc, &facet, &state.fields(&facet), OUTSIDE_TEMPERATURE);
    assert_eq!(outside, DMatrix::zeros(4, 4));
}

#[test]
fn inflow_derivatives_match_finite_differences() {
    // Facet 3 is the left edge, where positive x-velocity enters the domain
    let facet = square_facet(3);
    let state = coupled_state([1.0, 1.5, 0.5, 0.8]);
    let bc = coupled_bc();

    assert_jacobian_matches_finite_difference(&bc, &facet, &state);
    for jvar in [VX, VY, DENSITY, HEAT_CAPACITY, VOLUME_FRACTION, OUTSIDE_TEMPERATURE] {
        assert_off_diagonal_matches_finite_difference(&bc, &facet, &state, jvar);
    }
    assert_eq!(local_jacobian(&bc, &facet, &state.fields(&facet)), DMatrix::zeros(4, 4));
}

#[test]
fn coupled_variables_include_outside_temperature() {
    let bc = coupled_bc();
    assert_eq!(
        Kernel::<f64, U2>::coupled_variables(&bc),
        vec![VX, VY, OUTSIDE_TEMPERATURE, DENSITY, HEAT_CAPACITY, VOLUME_FRACTION]
    );
    assert_eq!(
        Kernel::<f64, U1>::coupled_variables(&bc),
        vec![VX, OUTSIDE_TEMPERATURE, DENSITY, HEAT_CAPACITY, VOLUME_FRACTION]
    );
    assert!(Kernel::<f64, U2>::requires_normals(&bc));
    assert_eq!(Kernel::<f64, U2>::name(&bc), "ThermalFluidFluxBC");
}
