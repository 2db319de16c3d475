use crate::{local_residual, unit_segment, NodalState};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DVector, U1, U2};
use teal::config::{
    registered_kernels, BoundaryConditionConfig, CoupledParameter, HeatConductionParams, KernelConfig, ProblemConfig,
};
use teal::kernels::Upwinding;
use teal::variable::{Coupled, VariableRegistry};

const PROBLEM: &str = r#"{
    "kernels": [
        {
            "type": "HeatConduction",
            "variable": "temp_fluid",
            "thermal_conductivity": 0.6,
            "volume_frac": "porosity"
        },
        {
            "type": "HeatAdvectionConservative",
            "variable": "temp_fluid",
            "density": "rho_fluid",
            "heat_capacity": 4180.0,
            "volume_frac": "porosity",
            "vel_x": "vel_x",
            "vel_y": 0.0,
            "vel_z": 0.0,
            "upwinding_type": "full"
        },
        {
            "type": "HeatConvection",
            "variable": "temp_fluid",
            "convection_coeff": 100.0,
            "coupled_temperature": "temp_solid",
            "specific_area": 50.0
        },
        {
            "type": "HeatAccumulation",
            "variable": "temp_solid",
            "density": 2500.0,
            "heat_capacity": 800.0
        },
        {
            "type": "HeatSource",
            "variable": "temp_solid",
            "coupled_source": "power"
        }
    ],
    "bcs": [
        {
            "type": "ThermalFluidFluxBC",
            "variable": "temp_fluid",
            "boundary": ["left", "right"],
            "density": "rho_fluid",
            "heat_capacity": 4180.0,
            "volume_frac": "porosity",
            "vel_x": "vel_x",
            "vel_y": 0.0,
            "vel_z": 0.0,
            "outside_temperature": 293.15
        }
    ]
}"#;

#[test]
fn problem_config_is_parsed() {
    let config: ProblemConfig = serde_json::from_str(PROBLEM).unwrap();
    assert_eq!(config.kernels.len(), 5);
    assert_eq!(config.bcs.len(), 1);

    match &config.kernels[1] {
        KernelConfig::HeatAdvectionConservative(params) => {
            assert_eq!(params.upwinding_type, Upwinding::Full);
            assert_eq!(params.density, CoupledParameter::Variable("rho_fluid".to_string()));
            assert_eq!(params.heat_capacity, CoupledParameter::Constant(4180.0));
        }
        other => panic!("unexpected kernel {:?}", other),
    }
    assert_eq!(config.bcs[0].boundary(), &["left".to_string(), "right".to_string()]);
}

#[test]
fn optional_parameters_take_defaults() {
    let config: KernelConfig = serde_json::from_str(
        r#"{
            "type": "HeatAdvectionConservative",
            "variable": "T",
            "density": 1.0,
            "heat_capacity": 1.0,
            "vel_x": 1.0,
            "vel_y": 0.0,
            "vel_z": 0.0
        }"#,
    )
    .unwrap();
    match config {
        KernelConfig::HeatAdvectionConservative(params) => {
            assert_eq!(params.upwinding_type, Upwinding::None);
            assert_eq!(params.volume_frac, CoupledParameter::Constant(1.0));
        }
        other => panic!("unexpected kernel {:?}", other),
    }
}

#[test]
fn invalid_configurations_are_rejected() {
    let missing_field = r#"{ "type": "HeatConduction", "variable": "T" }"#;
    assert!(serde_json::from_str::<KernelConfig>(missing_field).is_err());

    let unknown_upwinding = r#"{
        "type": "HeatAdvectionConservative",
        "variable": "T",
        "density": 1.0,
        "heat_capacity": 1.0,
        "vel_x": 1.0,
        "vel_y": 0.0,
        "vel_z": 0.0,
        "upwinding_type": "partial"
    }"#;
    assert!(serde_json::from_str::<KernelConfig>(unknown_upwinding).is_err());

    let missing_velocity = r#"{
        "type": "ThermalFluidFluxBC",
        "variable": "T",
        "boundary": [],
        "density": 1.0,
        "heat_capacity": 1.0,
        "vel_x": 1.0,
        "outside_temperature": 300.0
    }"#;
    assert!(serde_json::from_str::<BoundaryConditionConfig>(missing_velocity).is_err());

    let unknown_type = r#"{ "type": "HeatRadiation", "variable": "T" }"#;
    assert!(serde_json::from_str::<KernelConfig>(unknown_type).is_err());
}

#[test]
fn built_kernels_resolve_variables() {
    let config: ProblemConfig = serde_json::from_str(PROBLEM).unwrap();
    let mut registry = VariableRegistry::new();
    config.register_variables(&mut registry);
    for name in ["temp_fluid", "porosity", "rho_fluid", "vel_x", "temp_solid", "power"] {
        assert!(registry.id(name).is_some(), "{} was not registered", name);
    }
    assert_eq!(registry.len(), 6);

    let kernels = config.build_kernels::<f64, U2>(&registry).unwrap();
    let names: Vec<_> = kernels.iter().map(|bound| bound.kernel.name()).collect();
    assert_eq!(
        names,
        ["HeatConduction", "HeatAdvectionConservative", "HeatConvection", "HeatAccumulation", "HeatSource"]
    );
    assert_eq!(kernels[0].variable, registry.id("temp_fluid").unwrap());
    assert_eq!(kernels[3].variable, registry.id("temp_solid").unwrap());

    let mut expected_advection_coupling = vec![
        registry.id("porosity").unwrap(),
        registry.id("rho_fluid").unwrap(),
        registry.id("vel_x").unwrap(),
    ];
    expected_advection_coupling.sort();
    assert_eq!(kernels[1].kernel.coupled_variables(), expected_advection_coupling);

    let bcs = config
        .build_boundary_conditions::<f64, U2>(&registry)
        .unwrap();
    assert_eq!(bcs[0].boundary, vec!["left".to_string(), "right".to_string()]);
    assert!(bcs[0].kernel.requires_normals());
}

#[test]
fn unknown_variable_fails_to_build() {
    let config: ProblemConfig = serde_json::from_str(PROBLEM).unwrap();
    let mut registry = VariableRegistry::new();
    registry.register("temp_fluid");
    let error = config
        .build_kernels::<f64, U1>(&registry)
        .err()
        .expect("Building with missing variables must fail");
    assert!(error.to_string().contains("porosity"));
}

#[test]
fn built_kernel_matches_direct_construction() {
    let params = HeatConductionParams {
        variable: "T".to_string(),
        thermal_conductivity: 2.0.into(),
        volume_frac: 0.5.into(),
    };
    let mut registry = VariableRegistry::new();
    registry.register("T");
    let bound = KernelConfig::HeatConduction(params)
        .build::<f64, U1>(&registry)
        .unwrap();

    let element = unit_segment();
    let fields = NodalState::new(&[0.0, 1.0]).fields(&element);
    let residual = local_residual(bound.kernel.as_ref(), &element, &fields);
    assert_matrix_eq!(residual, DVector::from_column_slice(&[-1.0, 1.0]), comp = abs, tol = 1e-14);
}

#[test]
fn coupled_parameters_resolve() {
    let mut registry = VariableRegistry::new();
    let porosity = registry.register("porosity");
    let constant = CoupledParameter::from(0.25).resolve::<f64>(&registry).unwrap();
    let variable = CoupledParameter::from("porosity").resolve::<f64>(&registry).unwrap();
    assert_eq!(constant, Coupled::Constant(0.25));
    assert_eq!(variable, Coupled::Variable(porosity));
    assert!(CoupledParameter::from("missing")
        .resolve::<f64>(&registry)
        .is_err());
}

#[test]
fn every_type_is_registered() {
    let names = registered_kernels();
    for name in [
        "HeatConduction",
        "HeatConvection",
        "HeatAccumulation",
        "HeatSource",
        "HeatAdvectionConservative",
        "ThermalFluidFluxBC",
    ] {
        assert!(names.contains(&name), "{} is missing", name);
    }
}
