use clap::{App, Arg, SubCommand};
use voteticket::{
    build_registration, decode_decision, decrypt_vote, derive_shared_secret, encrypt_vote,
    ticket_digest, validate_ticket, AccountContext, Decision, EthAddress, LocalWallet, PublicKey,
    RecoverableSignature, SessionKeyPair, SessionKeyStore,
};

mod storage;

use storage::FileSessionStorage;

fn main() {
    let matches = App::new("VoteTicket CLI")
        .version("0.1")
        .about("Headless voter client for ticket-based voting sessions")
        .arg(
            Arg::with_name("keyfile")
                .long("keyfile")
                .takes_value(true)
                .help("Session key file - can also be set with VOTETICKET_KEYFILE"),
        )
        .subcommand(SubCommand::with_name("gen-key").about("Generate or show the session key"))
        .subcommand(
            SubCommand::with_name("sign-register")
                .about("Produce a registration request for a voting session")
                .arg(Arg::with_name("CONTRACT").index(1).required(true))
                .arg(Arg::with_name("VOTING_ID").index(2).required(true))
                .arg(Arg::with_name("MANAGER_ADDR").index(3).required(true)),
        )
        .subcommand(
            SubCommand::with_name("validate-ticket")
                .about("Check a ticket against the expected session manager")
                .arg(Arg::with_name("CONTRACT").index(1).required(true))
                .arg(Arg::with_name("VOTING_ID").index(2).required(true))
                .arg(Arg::with_name("VOTER_ADDR").index(3).required(true))
                .arg(Arg::with_name("MANAGER_ADDR").index(4).required(true))
                .arg(Arg::with_name("TICKET").index(5).required(true)),
        )
        .subcommand(
            SubCommand::with_name("encrypt-vote")
                .about("Encrypt a ballot decision for the session manager")
                .arg(Arg::with_name("MANAGER_KEY").index(1).required(true))
                .arg(Arg::with_name("DECISION").index(2).required(true)),
        )
        .subcommand(
            SubCommand::with_name("decrypt-vote")
                .about("Re-open an envelope for confirmation")
                .arg(Arg::with_name("MANAGER_KEY").index(1).required(true))
                .arg(Arg::with_name("ENVELOPE").index(2).required(true)),
        )
        .get_matches();

    let env_var = std::env::var("VOTETICKET_KEYFILE");
    let keyfile = match matches.value_of("keyfile") {
        Some(path) => path,
        None => env_var.as_deref().unwrap_or("session-key.hex"),
    };

    if let Some(_matches) = matches.subcommand_matches("gen-key") {
        command_gen_key(keyfile);
    }
    if let Some(matches) = matches.subcommand_matches("sign-register") {
        command_sign_register(matches, keyfile);
    }
    if let Some(matches) = matches.subcommand_matches("validate-ticket") {
        command_validate_ticket(matches);
    }
    if let Some(matches) = matches.subcommand_matches("encrypt-vote") {
        command_encrypt_vote(matches, keyfile);
    }
    if let Some(matches) = matches.subcommand_matches("decrypt-vote") {
        command_decrypt_vote(matches, keyfile);
    }
}

fn session_key(keyfile: &str) -> SessionKeyPair {
    let mut store = SessionKeyStore::new(FileSessionStorage::new(keyfile));
    store.current_key().unwrap_or_else(|e| {
        eprintln!("voteticket: unable to load session key from {}: {}", keyfile, e);
        std::process::exit(1);
    })
}

fn command_gen_key(keyfile: &str) {
    let key = session_key(keyfile);
    println!("KEY {}", key.public_key_hex());
    println!("ADDR {}", key.address().to_hex_string());
}

fn command_sign_register(matches: &clap::ArgMatches, keyfile: &str) {
    let contract = required_address(matches, "CONTRACT");
    let voting_id = matches.value_of("VOTING_ID").unwrap();
    let manager = required_address(matches, "MANAGER_ADDR");

    let session = session_key(keyfile);

    // Headless mode: the session key itself acts as the wallet account.
    let wallet = LocalWallet::new(session.secret().clone());
    let context = AccountContext::with_account(wallet.address());

    let request = build_registration(&wallet, &context, &contract, voting_id, &manager, &session)
        .unwrap_or_else(|e| {
            eprintln!("voteticket sign-register: {}", e);
            std::process::exit(1);
        });

    println!("{}", serde_json::to_string_pretty(&request).unwrap());
}

fn command_validate_ticket(matches: &clap::ArgMatches) {
    let contract = matches.value_of("CONTRACT").unwrap();
    let voting_id = matches.value_of("VOTING_ID").unwrap();
    let voter = matches.value_of("VOTER_ADDR").unwrap();
    let manager = required_address(matches, "MANAGER_ADDR");
    let ticket = matches.value_of("TICKET").unwrap();

    let digest = ticket_digest(contract, voting_id, voter).unwrap_or_else(|e| {
        eprintln!("voteticket validate-ticket: {}", e);
        std::process::exit(1);
    });
    let signature = RecoverableSignature::from_hex(ticket).unwrap_or_else(|e| {
        eprintln!("voteticket validate-ticket: {}", e);
        std::process::exit(1);
    });
    let validation = validate_ticket(&digest, &signature, &manager).unwrap_or_else(|e| {
        eprintln!("voteticket validate-ticket: {}", e);
        std::process::exit(1);
    });

    println!("MANAGER {}", validation.resolved_address.to_hex_string());
    if validation.is_valid {
        println!("OK");
    } else {
        eprintln!("voteticket validate-ticket: resolved address does not match manager");
        std::process::exit(1);
    }
}

fn command_encrypt_vote(matches: &clap::ArgMatches, keyfile: &str) {
    let manager_key = required_public_key(matches, "MANAGER_KEY");
    let decision: u32 = matches
        .value_of("DECISION")
        .unwrap()
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("voteticket encrypt-vote: decision must be 0 (abstain), 1 (yea) or 2 (no)");
            std::process::exit(1);
        });
    let decision = Decision::from_u32(decision).unwrap_or_else(|e| {
        eprintln!("voteticket encrypt-vote: {}", e);
        std::process::exit(1);
    });

    let session = session_key(keyfile);
    let shared = derive_shared_secret(session.secret(), &manager_key).unwrap_or_else(|e| {
        eprintln!("voteticket encrypt-vote: {}", e);
        std::process::exit(1);
    });
    let envelope = encrypt_vote(decision, &shared).unwrap_or_else(|e| {
        eprintln!("voteticket encrypt-vote: {}", e);
        std::process::exit(1);
    });

    println!("CT {}", hex::encode(&envelope));
}

fn command_decrypt_vote(matches: &clap::ArgMatches, keyfile: &str) {
    let manager_key = required_public_key(matches, "MANAGER_KEY");
    let envelope = hex::decode(matches.value_of("ENVELOPE").unwrap()).unwrap_or_else(|_| {
        eprintln!("voteticket decrypt-vote: envelope must be hex");
        std::process::exit(1);
    });

    let session = session_key(keyfile);
    let shared = derive_shared_secret(session.secret(), &manager_key).unwrap_or_else(|e| {
        eprintln!("voteticket decrypt-vote: {}", e);
        std::process::exit(1);
    });
    let plaintext = decrypt_vote(&envelope, &shared).unwrap_or_else(|e| {
        eprintln!("voteticket decrypt-vote: {}", e);
        std::process::exit(1);
    });
    let decision = decode_decision(&plaintext).unwrap_or_else(|e| {
        eprintln!("voteticket decrypt-vote: {}", e);
        std::process::exit(1);
    });

    println!("DECISION {:?}", decision);
}

fn required_address(matches: &clap::ArgMatches, name: &str) -> EthAddress {
    EthAddress::from_hex(matches.value_of(name).unwrap()).unwrap_or_else(|e| {
        eprintln!("voteticket: invalid {}: {}", name.to_lowercase(), e);
        std::process::exit(1);
    })
}

fn required_public_key(matches: &clap::ArgMatches, name: &str) -> PublicKey {
    let hex_key = matches.value_of(name).unwrap();
    let bytes = hex::decode(hex_key.trim_start_matches("0x")).unwrap_or_else(|_| {
        eprintln!("voteticket: invalid {}: not hex", name.to_lowercase());
        std::process::exit(1);
    });
    PublicKey::parse_slice(&bytes, None).unwrap_or_else(|e| {
        eprintln!("voteticket: invalid {}: {:?}", name.to_lowercase(), e);
        std::process::exit(1);
    })
}
