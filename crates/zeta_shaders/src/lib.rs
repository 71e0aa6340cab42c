//! Centralized storage for WGSL shader sources and shader-related helpers.

/// Kernel bodies. They reference `WORKGROUP_SIZE` without declaring it; run them
/// through [`instantiate`] before compiling.
pub mod compute {
    pub const ZETA_TERM: &str = include_str!("kernels/zeta_term.wgsl");
    pub const SUM_REDUCE: &str = include_str!("kernels/sum_reduce.wgsl");

    pub const ZETA_TERM_ENTRY: &str = "zeta_term_kernel";
    pub const SUM_REDUCE_ENTRY: &str = "sum_reduce_kernel";
}

/// Prepends the `WORKGROUP_SIZE` constant to a kernel body.
///
/// The tree reduction halves its stride each step, so `workgroup_size` must be a
/// power of two.
pub fn instantiate(body: &str, workgroup_size: u32) -> String {
    debug_assert!(
        workgroup_size.is_power_of_two(),
        "workgroup size {workgroup_size} is not a power of two"
    );
    format!("const WORKGROUP_SIZE: u32 = {workgroup_size}u;\n\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    fn validate_wgsl(label: &str, source: &str) -> naga::Module {
        let module =
            naga::front::wgsl::parse_str(source).unwrap_or_else(|err| panic!("{label}: {err:?}"));
        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        validator
            .validate(&module)
            .unwrap_or_else(|err| panic!("{label}: {err:?}"));
        module
    }

    fn entry_workgroup_size(module: &naga::Module, name: &str) -> [u32; 3] {
        module
            .entry_points
            .iter()
            .find(|ep| ep.name == name)
            .unwrap_or_else(|| panic!("entry point {name} missing"))
            .workgroup_size
    }

    #[test]
    fn compute_shaders_validate() {
        for size in [2, 64, 256, 1024] {
            let term = validate_wgsl("zeta_term", &instantiate(compute::ZETA_TERM, size));
            assert_eq!(
                entry_workgroup_size(&term, compute::ZETA_TERM_ENTRY),
                [size, 1, 1]
            );
            let sum = validate_wgsl("sum_reduce", &instantiate(compute::SUM_REDUCE, size));
            assert_eq!(
                entry_workgroup_size(&sum, compute::SUM_REDUCE_ENTRY),
                [size, 1, 1]
            );
        }
    }

    #[test]
    fn bodies_need_instantiation() {
        assert!(naga::front::wgsl::parse_str(compute::ZETA_TERM).is_err());
        assert!(!compute::ZETA_TERM.contains("const WORKGROUP_SIZE"));
    }
}
