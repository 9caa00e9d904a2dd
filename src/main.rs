use shadegraph::{graph, node, prelude::*, sref};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let graph = graph! {
        nodes:
            "geometry": node!(Geometry),
            "albedo": node!(Texture { "texture": "bricks" }),
            "specular": node!(ConstantFloat { "value": "0.5" }),
            "shininess": node!(ConstantFloat { "value": "32.0" }),
            "shading": node!(BlinnPhong),
            "exposure": node!(ConstantFloat { "value": "1.2" }),
            "tonemap": node!(ACESFilmicToneMapping),
            "output": node!(FragColor);
        links:
            sref!(node "geometry" "uv0") => sref!(node "albedo" "uv"),
            sref!(node "geometry" "normal") => sref!(node "shading" "normal"),
            sref!(node "albedo" "rgb") => sref!(node "shading" "color"),
            sref!(node "specular" "value") => sref!(node "shading" "specular"),
            sref!(node "shininess" "value") => sref!(node "shading" "shininess"),
            sref!(node "shading" "color") => sref!(node "tonemap" "color"),
            sref!(node "exposure" "value") => sref!(node "tonemap" "exposure"),
            sref!(node "tonemap" "result") => sref!(node "output" "color"),
            sref!(node "albedo" "a") => sref!(node "output" "alpha"),
    }
    .validate()?;

    let mut engine = Engine::new(Config::default())?;
    let shader = engine.process(&graph)?;

    println!("// Vertex shader\n{}", shader.vertex_shader);
    println!("// Fragment shader\n{}", shader.fragment_shader);

    for (name, binding) in shader.uniforms.iter() {
        println!("// uniform {} {name} = {:?}", binding.r#type, binding.value);
    }

    Ok(())
}
