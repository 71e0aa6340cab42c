use std::future::Future;
use std::sync::mpsc;

use bytemuck::bytes_of;
use tracing::trace;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Buffer, BufferDescriptor, BufferUsages, CommandEncoderDescriptor, ComputePassDescriptor,
    Device, MapMode, PollType,
};
use zeta_core::gpu::{PartialSumGpu, ZetaTermParams};
use zeta_core::{AsyncPartialSumBackend, Complex, PartialSumBackend, ReductionPlan};

use crate::context::ComputeContext;
use crate::error::GpuError;

/// Partial sums of the mod-3 series on the GPU, in f32.
///
/// Each call encodes the term pass and one sum pass per reduction level into a
/// single compute pass, then blocks on the readback of the one-element result.
pub struct GpuPartialSum<'ctx> {
    context: &'ctx ComputeContext,
    plan: ReductionPlan,
}

impl<'ctx> GpuPartialSum<'ctx> {
    pub fn new(context: &'ctx ComputeContext) -> Result<Self, GpuError> {
        let plan = context.plan()?;
        Ok(Self::with_plan(context, plan))
    }

    /// Uses an explicit plan; it is checked against the device on every call.
    pub fn with_plan(context: &'ctx ComputeContext, plan: ReductionPlan) -> Self {
        Self { context, plan }
    }

    pub fn context(&self) -> &ComputeContext {
        self.context
    }

    /// Submits and reads back one partial sum.
    ///
    /// The readback calls `Device::poll(PollType::Wait)`, so the first poll of
    /// this future blocks the calling thread until the device is idle.
    pub async fn evaluate(&self, s: Complex) -> Result<Complex, GpuError> {
        let context = self.context;
        let plan = &self.plan;
        context.check_plan(plan)?;

        let device = context.device();
        let params = ZetaTermParams::new(s, plan);
        let params_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("zeta_term_params"),
            contents: bytes_of(&params),
            usage: BufferUsages::UNIFORM,
        });

        // Fresh buffers are zero-filled, which pads every level past its last group.
        let level_buffers: Vec<Buffer> = plan
            .levels
            .iter()
            .enumerate()
            .map(|(index, &len)| {
                let label = format!("zeta_level_{index}");
                device.create_buffer(&BufferDescriptor {
                    label: Some(&label),
                    size: len as u64 * PartialSumGpu::STRIDE,
                    usage: BufferUsages::STORAGE,
                    mapped_at_creation: false,
                })
            })
            .collect();
        let result_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("zeta_result"),
            size: PartialSumGpu::STRIDE,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("zeta_staging"),
            size: PartialSumGpu::STRIDE,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let term_bind_group = context.term_bind_group(&params_buffer, &level_buffers[0]);
        let sum_bind_groups: Vec<_> = level_buffers
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let output = level_buffers.get(index + 1).unwrap_or(&result_buffer);
                context.sum_bind_group(input, output)
            })
            .collect();

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("zeta_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some("zeta_reduction_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(context.term_pipeline());
            pass.set_bind_group(0, &term_bind_group, &[]);
            pass.dispatch_workgroups(plan.term_workgroups(), 1, 1);

            pass.set_pipeline(context.sum_pipeline());
            for (bind_group, &len) in sum_bind_groups.iter().zip(&plan.levels) {
                pass.set_bind_group(0, bind_group, &[]);
                pass.dispatch_workgroups(plan.workgroups_for(len), 1, 1);
            }
        }
        encoder.copy_buffer_to_buffer(
            &result_buffer,
            0,
            &staging_buffer,
            0,
            PartialSumGpu::STRIDE,
        );
        context.queue().submit(std::iter::once(encoder.finish()));
        trace!(%s, dispatches = plan.dispatch_count(), "submitted zeta reduction");

        read_partial_sum(device, &staging_buffer)
    }
}

fn read_partial_sum(device: &Device, staging: &Buffer) -> Result<Complex, GpuError> {
    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(PollType::Wait)
        .map_err(|err| GpuError::Poll(err.to_string()))?;
    receiver
        .recv()
        .map_err(|_| GpuError::Map("map callback was dropped".into()))?
        .map_err(|err| GpuError::Map(err.to_string()))?;

    let data = slice.get_mapped_range();
    let value = if data.len() >= PartialSumGpu::STRIDE as usize {
        Ok(bytemuck::pod_read_unaligned::<PartialSumGpu>(&data[..PartialSumGpu::STRIDE as usize]))
    } else {
        Err(GpuError::Map(format!("mapped {} bytes, expected 8", data.len())))
    };
    drop(data);
    staging.unmap();
    Ok(value?.to_complex())
}

impl PartialSumBackend for GpuPartialSum<'_> {
    fn plan(&self) -> &ReductionPlan {
        &self.plan
    }

    fn partial_sum(&self, s: Complex) -> zeta_core::error::Result<Complex> {
        Ok(pollster::block_on(self.evaluate(s))?)
    }
}

impl AsyncPartialSumBackend for GpuPartialSum<'_> {
    fn partial_sum_async(
        &self,
        s: Complex,
    ) -> impl Future<Output = zeta_core::error::Result<Complex>> + '_ {
        async move { Ok(self.evaluate(s).await?) }
    }
}
