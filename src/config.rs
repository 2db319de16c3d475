//! Deserializable descriptions of kernels and boundary conditions.
//!
//! Parameter names follow the conventions of input files for thermal transport problems,
//! e.g. `thermal_conductivity`, `volume_frac` or `vel_x`. Every coupled parameter accepts
//! either the name of a variable or a numeric constant:
//!
//! ```
//! # use teal::config::KernelConfig;
//! let config: KernelConfig = serde_json::from_str(r#"{
//!     "type": "HeatConduction",
//!     "variable": "temp_solid",
//!     "thermal_conductivity": 2.5,
//!     "volume_frac": "porosity"
//! }"#).unwrap();
//! ```
use crate::bcs::ThermalFluidFluxBC;
use crate::kernel::Kernel;
use crate::kernels::{
    HeatAccumulation, HeatAdvectionConservative, HeatConduction, HeatConvection, HeatSource, Upwinding,
};
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::quadrature::scalar;
use crate::variable::{Coupled, VariableId, VariableRegistry};
use crate::Real;
use log::debug;
use serde::{Deserialize, Serialize};

/// A coupled parameter: a constant value or the name of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoupledParameter {
    Constant(f64),
    Variable(String),
}

impl CoupledParameter {
    /// Resolves variable names against the registry.
    pub fn resolve<T: Real>(&self, registry: &VariableRegistry) -> eyre::Result<Coupled<T>> {
        match self {
            Self::Constant(value) => Ok(Coupled::Constant(scalar(*value)?)),
            Self::Variable(name) => Ok(Coupled::Variable(registry.lookup(name)?)),
        }
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Constant(_) => None,
            Self::Variable(name) => Some(name),
        }
    }
}

impl From<f64> for CoupledParameter {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<&str> for CoupledParameter {
    fn from(name: &str) -> Self {
        Self::Variable(name.to_string())
    }
}

fn unit_volume_fraction() -> CoupledParameter {
    CoupledParameter::Constant(1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatConductionParams {
    pub variable: String,
    pub thermal_conductivity: CoupledParameter,
    #[serde(default = "unit_volume_fraction")]
    pub volume_frac: CoupledParameter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatConvectionParams {
    pub variable: String,
    pub convection_coeff: CoupledParameter,
    pub coupled_temperature: CoupledParameter,
    pub specific_area: CoupledParameter,
    #[serde(default = "unit_volume_fraction")]
    pub volume_frac: CoupledParameter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatAccumulationParams {
    pub variable: String,
    pub density: CoupledParameter,
    pub heat_capacity: CoupledParameter,
    #[serde(default = "unit_volume_fraction")]
    pub volume_frac: CoupledParameter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatSourceParams {
    pub variable: String,
    pub coupled_source: CoupledParameter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatAdvectionConservativeParams {
    pub variable: String,
    pub density: CoupledParameter,
    pub heat_capacity: CoupledParameter,
    #[serde(default = "unit_volume_fraction")]
    pub volume_frac: CoupledParameter,
    pub vel_x: CoupledParameter,
    pub vel_y: CoupledParameter,
    pub vel_z: CoupledParameter,
    #[serde(default)]
    pub upwinding_type: Upwinding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalFluidFluxBCParams {
    pub variable: String,
    /// Names of the side sets the condition is applied on.
    pub boundary: Vec<String>,
    pub density: CoupledParameter,
    pub heat_capacity: CoupledParameter,
    #[serde(default = "unit_volume_fraction")]
    pub volume_frac: CoupledParameter,
    pub vel_x: CoupledParameter,
    pub vel_y: CoupledParameter,
    pub vel_z: CoupledParameter,
    pub outside_temperature: CoupledParameter,
}

/// A volumetric kernel, identified by its `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KernelConfig {
    HeatConduction(HeatConductionParams),
    HeatConvection(HeatConvectionParams),
    HeatAccumulation(HeatAccumulationParams),
    HeatSource(HeatSourceParams),
    HeatAdvectionConservative(HeatAdvectionConservativeParams),
}

/// A boundary condition, identified by its `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoundaryConditionConfig {
    ThermalFluidFluxBC(ThermalFluidFluxBCParams),
}

/// All kernels and boundary conditions of a problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    #[serde(default)]
    pub kernels: Vec<KernelConfig>,
    #[serde(default)]
    pub bcs: Vec<BoundaryConditionConfig>,
}

/// A kernel together with the variable whose residual it contributes to.
pub struct BoundKernel<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub variable: VariableId,
    pub kernel: Box<dyn Kernel<T, D>>,
}

/// A boundary kernel together with its variable and the side sets it applies to.
pub struct BoundBoundaryCondition<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub variable: VariableId,
    pub boundary: Vec<String>,
    pub kernel: Box<dyn Kernel<T, D>>,
}

/// Type names of all kernels and boundary conditions that can be configured.
pub fn registered_kernels() -> &'static [&'static str] {
    &[
        "HeatConduction",
        "HeatConvection",
        "HeatAccumulation",
        "HeatSource",
        "HeatAdvectionConservative",
        "ThermalFluidFluxBC",
    ]
}

fn velocity<T: Real>(
    components: [&CoupledParameter; 3],
    registry: &VariableRegistry,
) -> eyre::Result<[Coupled<T>; 3]> {
    let [x, y, z] = components;
    Ok([x.resolve(registry)?, y.resolve(registry)?, z.resolve(registry)?])
}

impl KernelConfig {
    /// Name of the primary variable.
    pub fn variable(&self) -> &str {
        match self {
            Self::HeatConduction(params) => &params.variable,
            Self::HeatConvection(params) => &params.variable,
            Self::HeatAccumulation(params) => &params.variable,
            Self::HeatSource(params) => &params.variable,
            Self::HeatAdvectionConservative(params) => &params.variable,
        }
    }

    /// Names of all variables the kernel refers to, including the primary variable.
    pub fn variable_names(&self) -> Vec<&str> {
        let coupled: Vec<&CoupledParameter> = match self {
            Self::HeatConduction(p) => vec![&p.thermal_conductivity, &p.volume_frac],
            Self::HeatConvection(p) => vec![
                &p.convection_coeff,
                &p.coupled_temperature,
                &p.specific_area,
                &p.volume_frac,
            ],
            Self::HeatAccumulation(p) => vec![&p.density, &p.heat_capacity, &p.volume_frac],
            Self::HeatSource(p) => vec![&p.coupled_source],
            Self::HeatAdvectionConservative(p) => vec![
                &p.density,
                &p.heat_capacity,
                &p.volume_frac,
                &p.vel_x,
                &p.vel_y,
                &p.vel_z,
            ],
        };
        std::iter::once(self.variable())
            .chain(coupled.into_iter().filter_map(CoupledParameter::variable_name))
            .collect()
    }

    pub fn build<T, D>(&self, registry: &VariableRegistry) -> eyre::Result<BoundKernel<T, D>>
    where
        T: Real,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let variable = registry.lookup(self.variable())?;
        let kernel: Box<dyn Kernel<T, D>> = match self {
            Self::HeatConduction(p) => Box::new(
                HeatConduction::new(p.thermal_conductivity.resolve(registry)?)
                    .with_volume_fraction(p.volume_frac.resolve(registry)?),
            ),
            Self::HeatConvection(p) => Box::new(
                HeatConvection::new(
                    p.convection_coeff.resolve(registry)?,
                    p.coupled_temperature.resolve(registry)?,
                    p.specific_area.resolve(registry)?,
                )
                .with_volume_fraction(p.volume_frac.resolve(registry)?),
            ),
            Self::HeatAccumulation(p) => Box::new(
                HeatAccumulation::new(p.density.resolve(registry)?, p.heat_capacity.resolve(registry)?)
                    .with_volume_fraction(p.volume_frac.resolve(registry)?),
            ),
            Self::HeatSource(p) => Box::new(HeatSource::new(p.coupled_source.resolve(registry)?)),
            Self::HeatAdvectionConservative(p) => Box::new(
                HeatAdvectionConservative::new(
                    p.density.resolve(registry)?,
                    p.heat_capacity.resolve(registry)?,
                    velocity([&p.vel_x, &p.vel_y, &p.vel_z], registry)?,
                )
                .with_volume_fraction(p.volume_frac.resolve(registry)?)
                .with_upwinding(p.upwinding_type),
            ),
        };
        debug!(
            "Built kernel {} for variable \"{}\" coupled to {} other variable(s)",
            kernel.name(),
            self.variable(),
            kernel.coupled_variables().len()
        );
        Ok(BoundKernel { variable, kernel })
    }
}

impl BoundaryConditionConfig {
    pub fn variable(&self) -> &str {
        match self {
            Self::ThermalFluidFluxBC(params) => &params.variable,
        }
    }

    pub fn boundary(&self) -> &[String] {
        match self {
            Self::ThermalFluidFluxBC(params) => &params.boundary,
        }
    }

    /// Names of all variables the condition refers to, including the primary variable.
    pub fn variable_names(&self) -> Vec<&str> {
        let coupled = match self {
            Self::ThermalFluidFluxBC(p) => [
                &p.density,
                &p.heat_capacity,
                &p.volume_frac,
                &p.vel_x,
                &p.vel_y,
                &p.vel_z,
                &p.outside_temperature,
            ],
        };
        std::iter::once(self.variable())
            .chain(coupled.into_iter().filter_map(CoupledParameter::variable_name))
            .collect()
    }

    pub fn build<T, D>(&self, registry: &VariableRegistry) -> eyre::Result<BoundBoundaryCondition<T, D>>
    where
        T: Real,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let variable = registry.lookup(self.variable())?;
        let kernel: Box<dyn Kernel<T, D>> = match self {
            Self::ThermalFluidFluxBC(p) => Box::new(
                ThermalFluidFluxBC::new(
                    p.density.resolve(registry)?,
                    p.heat_capacity.resolve(registry)?,
                    velocity([&p.vel_x, &p.vel_y, &p.vel_z], registry)?,
                    p.outside_temperature.resolve(registry)?,
                )
                .with_volume_fraction(p.volume_frac.resolve(registry)?),
            ),
        };
        debug!(
            "Built boundary condition {} for variable \"{}\" on boundaries {:?}",
            kernel.name(),
            self.variable(),
            self.boundary()
        );
        Ok(BoundBoundaryCondition {
            variable,
            boundary: self.boundary().to_vec(),
            kernel,
        })
    }
}

impl ProblemConfig {
    /// Registers every variable referenced by the configuration.
    pub fn register_variables(&self, registry: &mut VariableRegistry) {
        let kernel_names = self.kernels.iter().flat_map(KernelConfig::variable_names);
        let bc_names = self
            .bcs
            .iter()
            .flat_map(BoundaryConditionConfig::variable_names);
        for name in kernel_names.chain(bc_names) {
            registry.register(name);
        }
    }

    pub fn build_kernels<T, D>(&self, registry: &VariableRegistry) -> eyre::Result<Vec<BoundKernel<T, D>>>
    where
        T: Real,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        self.kernels
            .iter()
            .map(|config| config.build(registry))
            .collect()
    }

    pub fn build_boundary_conditions<T, D>(
        &self,
        registry: &VariableRegistry,
    ) -> eyre::Result<Vec<BoundBoundaryCondition<T, D>>>
    where
        T: Real,
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        self.bcs.iter().map(|config| config.build(registry)).collect()
    }
}
