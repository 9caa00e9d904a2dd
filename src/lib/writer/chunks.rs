//! Built-in GLSL chunks, emitted depending on the writer's feature flags.

/// Numeric constants, always emitted first.
pub const CONSTANTS: &str = "#define RECIPROCAL_PI 0.3183098861837907
#define EPSILON 1e-6
";

/// Directional light array and ambient term, sized by `NUM_DIR_LIGHTS`.
pub fn lights(directional_lights: u32) -> String {
    format!(
        "#ifndef NUM_DIR_LIGHTS
#define NUM_DIR_LIGHTS {directional_lights}
#endif

struct DirectionalLight {{
\tvec3 direction;
\tvec3 color;
}};

#if NUM_DIR_LIGHTS > 0
uniform DirectionalLight directionalLights[NUM_DIR_LIGHTS];
#endif
uniform vec3 ambientLightColor;
"
    )
}

/// Tangent-space normal perturbation from screen-space derivatives. Requires the standard
/// derivatives extension.
pub const NORMAL_MAP: &str = "vec3 perturbNormal2Arb(vec3 eyePos, vec3 surfNorm, vec3 mapN, vec2 uv, float normalScale) {
\tvec3 q0 = vec3(dFdx(eyePos.x), dFdx(eyePos.y), dFdx(eyePos.z));
\tvec3 q1 = vec3(dFdy(eyePos.x), dFdy(eyePos.y), dFdy(eyePos.z));
\tvec2 st0 = dFdx(uv.st);
\tvec2 st1 = dFdy(uv.st);
\tvec3 S = normalize(q0 * st1.t - q1 * st0.t);
\tvec3 T = normalize(-q0 * st1.s + q1 * st0.s);
\tvec3 N = normalize(surfNorm);
\tmat3 tsn = mat3(S, T, N);
\tmapN.xy *= normalScale;
\treturn normalize(tsn * mapN);
}
";

/// Schlick's Fresnel approximation with a spherical gaussian exponent.
pub const FRESNEL: &str = "vec3 F_Schlick(const in vec3 specularColor, const in float dotLH) {
\tfloat fresnel = exp2((-5.55473 * dotLH - 6.98316) * dotLH);
\treturn (1.0 - specularColor) * fresnel + specularColor;
}
";

/// Varying declarations, shared by both stages.
pub const VARYING_UV: &str = "varying vec2 vUv;\n";
#[allow(missing_docs)]
pub const VARYING_NORMAL: &str = "varying vec3 vNormal;\n";
#[allow(missing_docs)]
pub const VARYING_POSITION: &str = "varying vec3 vViewPosition;\n";

/// Fragment prelude giving access to the interpolated normal.
pub const NORMAL_PRELUDE: &str = "vec3 normal = normalize(vNormal)";

/// Vertex stage assignments feeding the varyings.
pub const ASSIGN_UV: &str = "vUv = uv";
#[allow(missing_docs)]
pub const ASSIGN_NORMAL: &str = "vNormal = normalize(normalMatrix * normal)";
#[allow(missing_docs)]
pub const MODEL_VIEW_POSITION: &str = "vec4 mvPosition = modelViewMatrix * vec4(position, 1.0)";
#[allow(missing_docs)]
pub const ASSIGN_POSITION: &str = "vViewPosition = -mvPosition.xyz";
/// Always the last vertex statement.
pub const GL_POSITION: &str = "gl_Position = projectionMatrix * mvPosition";
