use std::borrow::Cow;

use tracing::{debug, info};
use wgpu::{
    Adapter, AdapterInfo, Backends, BindGroup, BindGroupDescriptor, BindGroupEntry,
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, Buffer,
    BufferBindingType, ComputePipeline, ComputePipelineDescriptor, Device, DeviceDescriptor,
    ErrorFilter, Features, Instance, InstanceDescriptor, PipelineLayoutDescriptor,
    PowerPreference, Queue, RequestAdapterOptions, ShaderStages,
};
use zeta_core::{EvaluatorSettings, ReductionPlan};
use zeta_shaders::{compute, instantiate};

use crate::error::GpuError;

/// Device, queue and the two reduction kernels compiled for one batch size.
///
/// Immutable after construction; every [`crate::GpuPartialSum`] call allocates
/// its own buffers, so a context can be shared across threads.
pub struct ComputeContext {
    adapter_info: AdapterInfo,
    device: Device,
    queue: Queue,
    term_layout: BindGroupLayout,
    sum_layout: BindGroupLayout,
    term_pipeline: ComputePipeline,
    sum_pipeline: ComputePipeline,
    batch_size: u32,
    oversampling: u32,
    max_workgroups_per_dimension: u32,
}

impl ComputeContext {
    pub async fn new(settings: &EvaluatorSettings) -> Result<Self, GpuError> {
        settings.validate()?;

        let instance = Instance::new(&InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        Self::from_adapter(adapter, settings).await
    }

    pub fn blocking_new(settings: &EvaluatorSettings) -> Result<Self, GpuError> {
        pollster::block_on(Self::new(settings))
    }

    async fn from_adapter(adapter: Adapter, settings: &EvaluatorSettings) -> Result<Self, GpuError> {
        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        let batch_size = settings.resolve_batch_size(
            limits.max_compute_invocations_per_workgroup,
            limits.max_compute_workgroup_size_x,
        );

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("zeta_device"),
                required_features: Features::empty(),
                required_limits: limits.clone(),
                ..Default::default()
            })
            .await?;

        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            batch_size,
            oversampling = settings.oversampling,
            "GPU compute context ready"
        );

        let (term_layout, sum_layout) = create_layouts(&device);

        device.push_error_scope(ErrorFilter::Validation);
        let term_pipeline = create_pipeline(
            &device,
            &term_layout,
            "zeta_term",
            &instantiate(compute::ZETA_TERM, batch_size),
            compute::ZETA_TERM_ENTRY,
        );
        let sum_pipeline = create_pipeline(
            &device,
            &sum_layout,
            "sum_reduce",
            &instantiate(compute::SUM_REDUCE, batch_size),
            compute::SUM_REDUCE_ENTRY,
        );
        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuError::Configuration(format!(
                "failed to compile reduction kernels at batch size {batch_size}: {err}"
            )));
        }
        debug!(batch_size, "compiled zeta_term and sum_reduce pipelines");

        Ok(Self {
            adapter_info,
            device,
            queue,
            term_layout,
            sum_layout,
            term_pipeline,
            sum_pipeline,
            batch_size,
            oversampling: settings.oversampling,
            max_workgroups_per_dimension: limits.max_compute_workgroups_per_dimension,
        })
    }

    /// Reduction plan for the configured oversampling at this context's batch size.
    pub fn plan(&self) -> Result<ReductionPlan, GpuError> {
        Ok(ReductionPlan::new(self.batch_size, self.oversampling)?)
    }

    /// Rejects plans the compiled kernels or the device cannot dispatch.
    pub fn check_plan(&self, plan: &ReductionPlan) -> Result<(), GpuError> {
        if plan.batch_size != self.batch_size {
            return Err(GpuError::Configuration(format!(
                "plan batch size {} does not match the compiled workgroup size {}",
                plan.batch_size, self.batch_size
            )));
        }
        check_dispatch_limit(plan, self.max_workgroups_per_dimension)
    }

    pub(crate) fn term_bind_group(&self, params: &Buffer, output: &Buffer) -> BindGroup {
        self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("zeta_term_bind_group"),
            layout: &self.term_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: params.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: output.as_entire_binding(),
                },
            ],
        })
    }

    pub(crate) fn sum_bind_group(&self, input: &Buffer, output: &Buffer) -> BindGroup {
        self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("sum_reduce_bind_group"),
            layout: &self.sum_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: input.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: output.as_entire_binding(),
                },
            ],
        })
    }

    pub fn adapter_info(&self) -> &AdapterInfo {
        &self.adapter_info
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub(crate) fn term_pipeline(&self) -> &ComputePipeline {
        &self.term_pipeline
    }

    pub(crate) fn sum_pipeline(&self) -> &ComputePipeline {
        &self.sum_pipeline
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn oversampling(&self) -> u32 {
        self.oversampling
    }

    pub fn max_workgroups_per_dimension(&self) -> u32 {
        self.max_workgroups_per_dimension
    }
}

pub(crate) fn check_dispatch_limit(plan: &ReductionPlan, limit: u32) -> Result<(), GpuError> {
    let needed = plan.max_workgroups();
    if needed > limit {
        return Err(GpuError::Configuration(format!(
            "reduction needs {needed} workgroups along x but the device allows {limit}"
        )));
    }
    Ok(())
}

fn create_layouts(device: &Device) -> (BindGroupLayout, BindGroupLayout) {
    let buffer_entry = |binding, ty: BufferBindingType| BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let term = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("zeta_term_bind_group_layout"),
        entries: &[
            buffer_entry(0, BufferBindingType::Uniform),
            buffer_entry(1, BufferBindingType::Storage { read_only: false }),
        ],
    });
    let sum = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("sum_reduce_bind_group_layout"),
        entries: &[
            buffer_entry(0, BufferBindingType::Storage { read_only: true }),
            buffer_entry(1, BufferBindingType::Storage { read_only: false }),
        ],
    });
    (term, sum)
}

fn create_pipeline(
    device: &Device,
    layout: &BindGroupLayout,
    label: &str,
    source: &str,
    entry_point: &str,
) -> ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    });
    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_limit_covers_every_pass() {
        let plan = ReductionPlan::new(256, 1024).unwrap();
        assert!(check_dispatch_limit(&plan, 65_535).is_ok());
        assert!(check_dispatch_limit(&plan, 1024).is_ok());

        let err = check_dispatch_limit(&plan, 1023).unwrap_err();
        assert!(matches!(err, GpuError::Configuration(_)));
        assert!(err.to_string().contains("1024 workgroups"));
    }
}
