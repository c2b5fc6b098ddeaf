//! Command-line arguments and the resolved settings each command runs with
//!
//! Every flag can also come from a `SUPERLICENSE_*` environment variable.
//! Arguments are checked and turned into plain config structs before any
//! key or artifact is touched.

use clap::Args;
use std::path::PathBuf;
use superlicense::mark::MACHINE_ID_PATH;
use superlicense::request::REQUEST_V1;
use superlicense::{KeyAlgorithm, SectionFlags};

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Key type: rsa, ed25519
    #[arg(short = 't', long = "type", default_value = "rsa", env = "SUPERLICENSE_KEY_TYPE")]
    pub key_type: String,

    /// Passphrase protecting the private key (empty for none)
    #[arg(short = 'P', long, default_value = "", env = "SUPERLICENSE_KEY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// File stem: writes <filename>.pem and <filename>.pub.pem
    #[arg(short = 'f', long, env = "SUPERLICENSE_KEY_FILE")]
    pub filename: Option<PathBuf>,

    /// RSA key size: 3072 or 4096
    #[arg(short = 'b', long, default_value_t = 4096, env = "SUPERLICENSE_KEY_BITS")]
    pub bits: usize,

    /// Comment stored in the private key header
    #[arg(short = 'C', long, default_value = "", env = "SUPERLICENSE_KEY_COMMENT")]
    pub comment: String,
}

#[derive(Args, Debug)]
pub struct LicenseBuildArgs {
    /// Artifact version
    #[arg(short = 'v', long, default_value = REQUEST_V1, env = "SUPERLICENSE_VERSION")]
    pub version: String,

    /// Creation request (JSON: {"Name": ..., "Claims": [...]})
    #[arg(short = 'r', long, env = "SUPERLICENSE_LICENSE_REQUEST")]
    pub request: PathBuf,

    /// Ed25519 private key for signing
    #[arg(short = 'p', long, default_value = "id_ed25519.pem", env = "SUPERLICENSE_SIGN_KEY")]
    pub signkey: PathBuf,

    /// Passphrase for the signing key
    #[arg(short = 'm', long, default_value = "", env = "SUPERLICENSE_SIGN_PASSWORD", hide_env_values = true)]
    pub signpassword: String,

    /// RSA private key for the encrypted section; omit for a clear-text license
    #[arg(short = 'e', long, env = "SUPERLICENSE_ENC_KEY")]
    pub enckey: Option<PathBuf>,

    /// Passphrase for the encryption key
    #[arg(short = 'n', long, default_value = "", env = "SUPERLICENSE_ENC_PASSWORD", hide_env_values = true)]
    pub encpassword: String,

    /// Leave out the clear-text section (requires --enckey)
    #[arg(long, env = "SUPERLICENSE_NO_RAW")]
    pub no_raw: bool,

    /// Output file
    #[arg(short = 'l', long, default_value = "license.dat", env = "SUPERLICENSE_LICENSE_PATH")]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct LicenseParseArgs {
    /// Artifact version
    #[arg(short = 'v', long, default_value = REQUEST_V1, env = "SUPERLICENSE_VERSION")]
    pub version: String,

    /// License file
    #[arg(short = 'l', long, default_value = "license.dat", env = "SUPERLICENSE_LICENSE_PATH")]
    pub path: PathBuf,

    /// Ed25519 public key for signature verification
    #[arg(short = 'p', long, default_value = "id_ed25519.pub.pem", env = "SUPERLICENSE_VERIFY_KEY")]
    pub signkey: PathBuf,

    /// RSA public key for the encrypted section
    #[arg(short = 'd', long, env = "SUPERLICENSE_DEC_KEY")]
    pub deckey: Option<PathBuf>,

    /// Fail if the clear-text and encrypted sections disagree
    #[arg(long, env = "SUPERLICENSE_CHECK_SECTIONS")]
    pub check_sections: bool,
}

#[derive(Args, Debug)]
pub struct RequestBuildArgs {
    /// Artifact version
    #[arg(short = 'v', long, default_value = REQUEST_V1, env = "SUPERLICENSE_VERSION")]
    pub version: String,

    /// Issuer RSA public key for the encrypted section; omit for clear text
    #[arg(short = 'e', long, env = "SUPERLICENSE_ENC_KEY")]
    pub enckey: Option<PathBuf>,

    /// Leave out the clear-text section (requires --enckey)
    #[arg(long, env = "SUPERLICENSE_NO_RAW")]
    pub no_raw: bool,

    /// Where to read the machine identifier from
    #[arg(long, default_value = MACHINE_ID_PATH, env = "SUPERLICENSE_MACHINE_ID_PATH")]
    pub machine_id_path: PathBuf,

    /// Output file
    #[arg(short = 'l', long, default_value = "req.dat", env = "SUPERLICENSE_REQUEST_PATH")]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct RequestParseArgs {
    /// Artifact version
    #[arg(short = 'v', long, default_value = REQUEST_V1, env = "SUPERLICENSE_VERSION")]
    pub version: String,

    /// Request file
    #[arg(short = 'l', long, default_value = "req.dat", env = "SUPERLICENSE_REQUEST_PATH")]
    pub path: PathBuf,

    /// Issuer RSA private key for the encrypted section
    #[arg(short = 'd', long, env = "SUPERLICENSE_DEC_KEY")]
    pub deckey: Option<PathBuf>,

    /// Passphrase for the decryption key
    #[arg(short = 'n', long, default_value = "", env = "SUPERLICENSE_DEC_PASSWORD", hide_env_values = true)]
    pub decpassword: String,

    /// Fail if the clear-text and encrypted sections disagree
    #[arg(long, env = "SUPERLICENSE_CHECK_SECTIONS")]
    pub check_sections: bool,
}

#[derive(Debug)]
pub struct KeygenConfig {
    pub algorithm: KeyAlgorithm,
    pub bits: Option<usize>,
    pub stem: Option<PathBuf>,
    pub passphrase: String,
    pub comment: String,
}

#[derive(Debug)]
pub struct LicenseBuildConfig {
    pub request: PathBuf,
    pub sign_key: PathBuf,
    pub sign_passphrase: String,
    pub enc_key: Option<(PathBuf, String)>,
    pub flags: SectionFlags,
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct LicenseParseConfig {
    pub input: PathBuf,
    pub verify_key: PathBuf,
    pub dec_key: Option<PathBuf>,
    pub check_sections: bool,
}

#[derive(Debug)]
pub struct RequestBuildConfig {
    pub enc_key: Option<PathBuf>,
    pub flags: SectionFlags,
    pub machine_id_path: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct RequestParseConfig {
    pub input: PathBuf,
    pub dec_key: Option<(PathBuf, String)>,
    pub check_sections: bool,
}

fn check_version(version: &str) -> Result<(), String> {
    if version != REQUEST_V1 {
        return Err(format!("unsupported version: {} (supported: {})", version, REQUEST_V1));
    }
    Ok(())
}

/// Clear text unless `no_raw`; ciphertext whenever a key is given
fn section_flags(encrypt: bool, no_raw: bool) -> Result<SectionFlags, String> {
    match (encrypt, no_raw) {
        (false, true) => Err("--no-raw needs --enckey".to_string()),
        (false, false) => Ok(SectionFlags::RAW),
        (true, true) => Ok(SectionFlags::CIPHERTEXT),
        (true, false) => Ok(SectionFlags::RAW | SectionFlags::CIPHERTEXT),
    }
}

impl TryFrom<KeygenArgs> for KeygenConfig {
    type Error = String;

    fn try_from(args: KeygenArgs) -> Result<Self, Self::Error> {
        let algorithm: KeyAlgorithm = args.key_type.parse().map_err(|e| format!("{}", e))?;
        Ok(Self {
            algorithm,
            bits: (algorithm == KeyAlgorithm::Rsa).then_some(args.bits),
            stem: args.filename,
            passphrase: args.password,
            comment: args.comment,
        })
    }
}

impl TryFrom<LicenseBuildArgs> for LicenseBuildConfig {
    type Error = String;

    fn try_from(args: LicenseBuildArgs) -> Result<Self, Self::Error> {
        check_version(&args.version)?;
        let flags = section_flags(args.enckey.is_some(), args.no_raw)?;
        Ok(Self {
            request: args.request,
            sign_key: args.signkey,
            sign_passphrase: args.signpassword,
            enc_key: args.enckey.map(|path| (path, args.encpassword)),
            flags,
            output: args.path,
        })
    }
}

impl TryFrom<LicenseParseArgs> for LicenseParseConfig {
    type Error = String;

    fn try_from(args: LicenseParseArgs) -> Result<Self, Self::Error> {
        check_version(&args.version)?;
        Ok(Self {
            input: args.path,
            verify_key: args.signkey,
            dec_key: args.deckey,
            check_sections: args.check_sections,
        })
    }
}

impl TryFrom<RequestBuildArgs> for RequestBuildConfig {
    type Error = String;

    fn try_from(args: RequestBuildArgs) -> Result<Self, Self::Error> {
        check_version(&args.version)?;
        let flags = section_flags(args.enckey.is_some(), args.no_raw)?;
        Ok(Self {
            enc_key: args.enckey,
            flags,
            machine_id_path: args.machine_id_path,
            output: args.path,
        })
    }
}

impl TryFrom<RequestParseArgs> for RequestParseConfig {
    type Error = String;

    fn try_from(args: RequestParseArgs) -> Result<Self, Self::Error> {
        check_version(&args.version)?;
        Ok(Self {
            input: args.path,
            dec_key: args.deckey.map(|path| (path, args.decpassword)),
            check_sections: args.check_sections,
        })
    }
}
