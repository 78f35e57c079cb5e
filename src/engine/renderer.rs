use nalgebra::{Matrix4, Vector3};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext, WebGlUniformLocation};

use crate::engine::mesh::{Mesh, VERTEX_STRIDE};

type Gl = WebGlRenderingContext;

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aColor;
    uniform mat4 uModelViewProjection;
    varying vec3 vColor;
    varying vec3 vPos;
    void main() {
        gl_Position = uModelViewProjection * vec4(aPosition, 1.0);
        vPos = aPosition;
        vColor = aColor;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vColor;
    varying vec3 vPos;
    uniform vec3 uUniformColor;
    uniform bool uUseUniformColor;
    uniform vec3 uTint;
    uniform float uVignette;
    uniform vec2 uResolution;

    void main() {
        vec3 color = uUseUniformColor ? uUniformColor * vColor : vColor;
        color *= uTint;

        // Darker toward the bottom of each box
        float ao = mix(0.75, 1.0, smoothstep(-0.5, 0.5, vPos.y));
        color *= ao;

        // Vignette
        vec2 uv = gl_FragCoord.xy / uResolution;
        float edge = smoothstep(0.25, 0.75, distance(uv, vec2(0.5)));
        color *= 1.0 - uVignette * edge;

        gl_FragColor = vec4(color, 1.0);
    }
"#;

/// Index and vertex buffers of a mesh that lives on the GPU.
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    position_attrib: u32,
    color_attrib: u32,
    mvp_location: WebGlUniformLocation,
    uniform_color_location: WebGlUniformLocation,
    use_uniform_color_location: WebGlUniformLocation,
    tint_location: WebGlUniformLocation,
    vignette_location: WebGlUniformLocation,
    resolution_location: WebGlUniformLocation,
    unit_cube: GpuMesh,
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> Result<Self, JsValue> {
        let program = create_program(&gl)?;
        gl.use_program(Some(&program));

        let uniform = |name: &str| -> Result<WebGlUniformLocation, JsValue> {
            gl.get_uniform_location(&program, name)
                .ok_or_else(|| JsValue::from_str(&format!("Failed to get {} location", name)))
        };
        let mvp_location = uniform("uModelViewProjection")?;
        let uniform_color_location = uniform("uUniformColor")?;
        let use_uniform_color_location = uniform("uUseUniformColor")?;
        let tint_location = uniform("uTint")?;
        let vignette_location = uniform("uVignette")?;
        let resolution_location = uniform("uResolution")?;

        let position_attrib = gl.get_attrib_location(&program, "aPosition");
        let color_attrib = gl.get_attrib_location(&program, "aColor");
        if position_attrib < 0 || color_attrib < 0 {
            return Err(JsValue::from_str("Shader attributes missing"));
        }

        let unit_cube = upload(&gl, &Mesh::cube(1.0, [1.0, 1.0, 1.0]))?;

        gl.uniform3f(Some(&tint_location), 1.0, 1.0, 1.0);
        gl.uniform1f(Some(&vignette_location), 0.0);
        gl.uniform2f(Some(&resolution_location), 1.0, 1.0);

        Ok(Renderer {
            gl,
            position_attrib: position_attrib as u32,
            color_attrib: color_attrib as u32,
            mvp_location,
            uniform_color_location,
            use_uniform_color_location,
            tint_location,
            vignette_location,
            resolution_location,
            unit_cube,
        })
    }

    pub fn upload(&self, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
        upload(&self.gl, mesh)
    }

    pub fn unit_cube(&self) -> &GpuMesh {
        &self.unit_cube
    }

    pub fn clear(&self, color: [f32; 3]) {
        self.gl.clear_color(color[0], color[1], color[2], 1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    pub fn set_tint(&self, tint: [f32; 3]) {
        self.gl.uniform3f(Some(&self.tint_location), tint[0], tint[1], tint[2]);
    }

    pub fn set_vignette(&self, intensity: f32) {
        self.gl.uniform1f(Some(&self.vignette_location), intensity);
    }

    pub fn enable_depth_test(&self) {
        self.gl.enable(Gl::DEPTH_TEST);
    }

    /// Matches the viewport to the canvas and returns its size.
    pub fn fit_canvas(&self) -> Option<(u32, u32)> {
        let canvas = self.gl.canvas()?.dyn_into::<HtmlCanvasElement>().ok()?;
        let (width, height) = (canvas.width(), canvas.height());
        self.gl.viewport(0, 0, width as i32, height as i32);
        self.gl.uniform2f(Some(&self.resolution_location), width as f32, height as f32);
        Some((width, height))
    }

    pub fn draw_cube(&self, position: Vector3<f32>, size: Vector3<f32>, color: [f32; 3], view_projection: &Matrix4<f32>) {
        let model = Matrix4::new_translation(&position) * Matrix4::new_nonuniform_scaling(&size);
        self.draw(&self.unit_cube, &model, Some(color), view_projection);
    }

    /// Draws a mesh with its own vertex colours, or tinted by `color`.
    pub fn draw(&self, mesh: &GpuMesh, model: &Matrix4<f32>, color: Option<[f32; 3]>, view_projection: &Matrix4<f32>) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&mesh.vertex_buffer));
        self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));

        let stride = (VERTEX_STRIDE * 4) as i32;
        self.gl.vertex_attrib_pointer_with_i32(self.position_attrib, 3, Gl::FLOAT, false, stride, 0);
        self.gl.enable_vertex_attrib_array(self.position_attrib);
        self.gl.vertex_attrib_pointer_with_i32(self.color_attrib, 3, Gl::FLOAT, false, stride, 12);
        self.gl.enable_vertex_attrib_array(self.color_attrib);

        match color {
            Some([r, g, b]) => {
                self.gl.uniform1i(Some(&self.use_uniform_color_location), 1);
                self.gl.uniform3f(Some(&self.uniform_color_location), r, g, b);
            }
            None => self.gl.uniform1i(Some(&self.use_uniform_color_location), 0),
        }

        let mvp = view_projection * model;
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.mvp_location), false, mvp.as_slice());

        self.gl.draw_elements_with_i32(Gl::TRIANGLES, mesh.index_count, Gl::UNSIGNED_SHORT, 0);
    }
}

fn upload(gl: &WebGlRenderingContext, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
    let vertex_buffer = gl.create_buffer().ok_or("Failed to create vertex buffer")?;
    let index_buffer = gl.create_buffer().ok_or("Failed to create index buffer")?;

    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vertex_buffer));
    // SAFETY: the views are consumed by buffer_data before any allocation
    // can move the wasm memory they point into.
    unsafe {
        let vert_array = js_sys::Float32Array::view(&mesh.vertices);
        gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &vert_array, Gl::STATIC_DRAW);
    }

    gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
    unsafe {
        let idx_array = js_sys::Uint16Array::view(&mesh.indices);
        gl.buffer_data_with_array_buffer_view(Gl::ELEMENT_ARRAY_BUFFER, &idx_array, Gl::STATIC_DRAW);
    }

    Ok(GpuMesh { vertex_buffer, index_buffer, index_count: mesh.indices.len() as i32 })
}

fn create_program(gl: &WebGlRenderingContext) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
    let frag_shader = compile_shader(gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, Gl::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, Gl::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}
