use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::{scene_graph::PointLight, scene_host::FrameSnapshot};

/// Must match `MAX_LIGHTS` in `lambert.wgsl`.
pub const MAX_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// xyz = position, w = intensity
    pub position: [f32; 4],
    /// rgb = color, w = cut-off distance
    pub color: [f32; 4],
    /// x = decay
    pub params: [f32; 4],
}

impl From<&PointLight> for GpuPointLight {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.extend(light.intensity).to_array(),
            color: light.color.extend(light.distance).to_array(),
            params: [light.decay, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniformState {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub resolution: [f32; 2],
    pub light_count: u32,
    _padding: u32,
    pub lights: [GpuPointLight; MAX_LIGHTS],
}

impl FrameUniformState {
    pub fn from_snapshot(snapshot: &FrameSnapshot) -> Self {
        if snapshot.lights.len() > MAX_LIGHTS {
            log::warn!(
                "Scene has {} lights, only the first {} are used",
                snapshot.lights.len(),
                MAX_LIGHTS
            );
        }

        let mut lights = [GpuPointLight::default(); MAX_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(&snapshot.lights) {
            *slot = light.into();
        }

        Self {
            view_proj: snapshot.view_proj.to_cols_array_2d(),
            eye: snapshot.eye.extend(1.0).to_array(),
            resolution: [snapshot.size.0 as f32, snapshot.size.1 as f32],
            light_count: snapshot.lights.len().min(MAX_LIGHTS) as u32,
            _padding: 0,
            lights,
        }
    }
}

pub struct FrameUniform {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl FrameUniform {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame uniform buffer"),
            contents: bytemuck::cast_slice(&[FrameUniformState::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame uniform bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame uniform bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, state: &FrameUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*state]));
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec4};

    use super::*;

    fn snapshot(lights: Vec<PointLight>) -> FrameSnapshot {
        FrameSnapshot {
            clear_color: Vec4::ONE,
            view_proj: Mat4::IDENTITY,
            eye: Vec3::new(0.0, 0.0, 5.0),
            size: (640, 480),
            lights,
            items: Vec::new(),
        }
    }

    #[test]
    fn layout_matches_shader() {
        assert_eq!(std::mem::size_of::<GpuPointLight>(), 48);
        assert_eq!(std::mem::size_of::<FrameUniformState>(), 96 + 48 * MAX_LIGHTS);
        assert_eq!(std::mem::offset_of!(FrameUniformState, lights), 96);
    }

    #[test]
    fn packs_sample_light() {
        let state = FrameUniformState::from_snapshot(&snapshot(vec![PointLight::sample_light()]));
        assert_eq!(state.light_count, 1);
        assert_eq!(state.lights[0].position, [10.0, 0.0, 25.0, 1.0]);
        assert_eq!(state.lights[0].color, [1.0, 1.0, 1.0, 500.0]);
        assert_eq!(state.lights[0].params[0], 1.0);
        assert_eq!(state.resolution, [640.0, 480.0]);
        assert_eq!(state.eye, [0.0, 0.0, 5.0, 1.0]);
    }

    #[test]
    fn extra_lights_are_dropped() {
        let lights = vec![PointLight::sample_light(); MAX_LIGHTS + 2];
        let state = FrameUniformState::from_snapshot(&snapshot(lights));
        assert_eq!(state.light_count as usize, MAX_LIGHTS);
    }
}
