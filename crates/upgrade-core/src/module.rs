//! Selección de módulos de upgrade.
//!
//! Los módulos forman un conjunto cerrado; los tokens de texto sólo existen en
//! la frontera (CLI) y se validan aquí antes de abrir cualquier conexión.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::UpgradeError;

/// Token reservado que expande a todos los módulos conocidos.
pub const ALL_MODULE: &str = "all";

/// Módulo de upgrade. El orden de declaración es el orden de ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Module {
    NormalDdl,
    NormalDml,
    EachTenantDml,
    SpecialAction,
}

impl Module {
    pub const ALL: [Module; 4] = [Module::NormalDdl, Module::NormalDml, Module::EachTenantDml, Module::SpecialAction];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::NormalDdl => "normal_ddl",
            Module::NormalDml => "normal_dml",
            Module::EachTenantDml => "each_tenant_dml",
            Module::SpecialAction => "special_action",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = UpgradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL.iter()
                   .copied()
                   .find(|m| m.as_str() == s)
                   .ok_or_else(|| UpgradeError::InvalidModule(s.to_string()))
    }
}

/// Conjunto validado de módulos a ejecutar en esta corrida.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSet {
    inner: BTreeSet<Module>,
}

impl ModuleSet {
    pub fn all() -> Self {
        Self { inner: Module::ALL.into_iter().collect() }
    }

    /// Resuelve una lista separada por comas (`"normal_ddl,special_action"`).
    ///
    /// Todo o nada: el primer token desconocido (incluido el vacío) aborta la
    /// resolución completa con `InvalidModule`.
    pub fn parse(request: &str) -> Result<Self, UpgradeError> {
        let mut inner = BTreeSet::new();
        for token in request.split(',').map(str::trim) {
            if token == ALL_MODULE {
                inner.extend(Module::ALL);
            } else {
                inner.insert(token.parse::<Module>()?);
            }
        }
        Ok(Self { inner })
    }

    pub fn contains(&self, module: Module) -> bool {
        self.inner.contains(&module)
    }

    /// Itera en orden de ejecución.
    pub fn iter(&self) -> impl Iterator<Item = Module> + '_ {
        self.inner.iter().copied()
    }
}

impl FromIterator<Module> for ModuleSet {
    fn from_iter<T: IntoIterator<Item = Module>>(iter: T) -> Self {
        Self { inner: iter.into_iter().collect() }
    }
}

impl fmt::Display for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|m| m.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
