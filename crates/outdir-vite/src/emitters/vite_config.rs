use minijinja::{AutoEscape, Environment, context};
use outdir_core::GeneratorError;
use outdir_core::config::{ImportStyle, ProjectConfig, WatchPolicy};

use super::js_string;
use crate::command::OUT_DIR_ENV;

/// Program the generated config runs to resolve the output directory.
pub const RESOLVER_PROGRAM: &str = "outdir";

/// Emit `vite.config.js` for the project.
pub fn emit_vite_config(config: &ProjectConfig) -> Result<String, GeneratorError> {
    let mut env = Environment::new();
    // Values are pre-quoted as JS literals below
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_template(
        "vite.config.js.j2",
        include_str!("../../templates/vite.config.js.j2"),
    )
    .map_err(template_error)?;
    let tmpl = env.get_template("vite.config.js.j2").map_err(template_error)?;

    let plugins = config
        .plugins
        .iter()
        .map(|plugin| -> Result<minijinja::Value, GeneratorError> {
            let options = match plugin.options {
                Some(ref options) => serde_json::to_string(options)?,
                None => String::new(),
            };
            Ok(context! {
                factory => plugin.factory,
                module => js_string(&plugin.module),
                default_import => plugin.import == ImportStyle::Default,
                options => options,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let server = config.server.as_ref().map(|server| {
        context! {
            port => server.port,
            host => js_string(&server.host),
            use_polling => polling_expr(server.watch.policy),
            interval => server.watch.interval_ms,
        }
    });

    tmpl.render(context! {
        plugins => plugins,
        base => js_string(&config.base),
        server => server,
        empty_out_dir => js_bool(config.empty_out_dir),
        fallback_dir => js_string(&config.fallback_dir),
        out_dir_env => OUT_DIR_ENV,
        resolver => js_string(RESOLVER_PROGRAM),
    })
    .map_err(template_error)
}

/// JS expression deciding whether the dev server polls.
fn polling_expr(policy: WatchPolicy) -> &'static str {
    match policy {
        WatchPolicy::Always => "true",
        WatchPolicy::Never => "false",
        WatchPolicy::Container => "process.env.DOCKER === \"true\"",
    }
}

/// minijinja prints booleans Python-style, so hand the template a JS literal.
fn js_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn template_error(err: minijinja::Error) -> GeneratorError {
    GeneratorError::Template(err.to_string())
}
