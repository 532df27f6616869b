// Diagnóstico de redundancia sobre la base configurada en SIRDS_DB_URL.
// Sale con código 1 si encuentra problemas.

use std::process::ExitCode;

use sirds::diagnostico::diagnosticar;
use sirds::db::open_read_only;
use sirds::Config;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Config::from_env();

    let resultado = open_read_only(&config.db_url).and_then(|c| diagnosticar(&c));
    match resultado {
        Ok(reporte) => {
            println!("=== Diagnóstico de redundancia ({}) ===", config.db_url);
            print!("{}", reporte);
            if reporte.sin_problemas() {
                println!("Sin problemas.");
                ExitCode::SUCCESS
            } else {
                println!("{} problemas encontrados.", reporte.total_problemas());
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}
