use mxid_persistence::{HashStore, PersistenceError, SqlStorage, StorageConfig};

const USAGE: &str = "Uso:
  mxid-cli migrate
  mxid-cli hash --medium <M> --address <A> --pepper <P>
  mxid-cli lookup <HASH>...";

fn main() {
    // Cargar .env si existe para obtener MXID_*
    let _ = dotenvy::dotenv();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("migrate") => migrate(),
        Some("hash") => hash(&args[1..]),
        Some("lookup") => lookup(&args[1..]),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

/// Abre el almacenamiento desde el entorno. Termina el proceso con 2 si la
/// configuración es inválida y con 3 si falla una migración.
fn open_storage(cmd: &str) -> SqlStorage {
    let cfg = match StorageConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[mxid {cmd}] configuración inválida: {e}");
            std::process::exit(2);
        }
    };
    match SqlStorage::open(&cfg) {
        Ok(s) => s,
        Err(e @ PersistenceError::Configuration(_)) => {
            eprintln!("[mxid {cmd}] configuración inválida: {e}");
            std::process::exit(2);
        }
        Err(e @ PersistenceError::Migration { .. }) => {
            eprintln!("[mxid {cmd}] error de migración: {e}");
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("[mxid {cmd}] error de almacenamiento: {e}");
            std::process::exit(5);
        }
    }
}

fn migrate() {
    let storage = open_storage("migrate");
    match storage.changelog() {
        Ok(entries) => {
            println!("backend: {}", storage.backend());
            for entry in entries {
                match serde_json::to_string(&entry) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("[mxid migrate] no se pudo serializar {}: {e}", entry.name),
                }
            }
        }
        Err(e) => {
            eprintln!("[mxid migrate] error leyendo changelog: {e}");
            std::process::exit(5);
        }
    }
}

fn hash(args: &[String]) {
    let mut medium: Option<String> = None;
    let mut address: Option<String> = None;
    let mut pepper: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--medium" => { i += 1; medium = args.get(i).cloned(); }
            "--address" => { i += 1; address = args.get(i).cloned(); }
            "--pepper" => { i += 1; pepper = args.get(i).cloned(); }
            other => eprintln!("[mxid hash] argumento ignorado: {other}"),
        }
        i += 1;
    }
    let (Some(medium), Some(address), Some(pepper)) = (medium, address, pepper) else {
        eprintln!("Uso: mxid-cli hash --medium <M> --address <A> --pepper <P>");
        std::process::exit(1);
    };
    println!("{}", mxid_domain::lookup_hash(&medium, &address, &pepper));
}

fn lookup(hashes: &[String]) {
    if hashes.is_empty() {
        eprintln!("Uso: mxid-cli lookup <HASH>...");
        std::process::exit(1);
    }
    let storage = open_storage("lookup");
    match storage.find_hashes(hashes) {
        Ok(found) => {
            for (hash, m) in found {
                println!("{hash} {} {} {}", m.medium, m.address, m.mxid);
            }
        }
        Err(e) => {
            eprintln!("[mxid lookup] error: {e}");
            std::process::exit(5);
        }
    }
}
