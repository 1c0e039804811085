use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    native_token::LAMPORTS_PER_SOL,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    system_instruction,
    transaction::Transaction
};
use solana_client::nonblocking::rpc_client::RpcClient;
use spl_token::state::{Account as TokenAccount, Mint};
use escrow_exchange::state::EscrowRecord;


const DEPOSIT: u64 = 100;
const COUNTER: u64 = 50;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv()?;
    env_logger::init();

    log::info!("Running example!");

    let url: String = std::env::var("RPC_URL").unwrap_or_else(|_| String::from("http://127.0.0.1:8899"));
    let rpc_client: RpcClient = RpcClient::new(url);

    // 1. init depositor & taker, the depositor also pays for setup
    let Parties { depositor, taker } = init_parties(&rpc_client).await?;

    // 2. mints: X is offered by the depositor, Y is paid by the taker
    let mint_x: Keypair = Keypair::new();
    let mint_y: Keypair = Keypair::new();
    create_mint(&rpc_client, &depositor, &mint_x).await?;
    create_mint(&rpc_client, &depositor, &mint_y).await?;

    // 3. token accounts
    let holding: Pubkey = create_token_account(&rpc_client, &depositor, &mint_x.pubkey(), &depositor.pubkey(), DEPOSIT).await?;
    let payout: Pubkey = create_token_account(&rpc_client, &depositor, &mint_y.pubkey(), &depositor.pubkey(), 0).await?;
    let taker_send: Pubkey = create_token_account(&rpc_client, &depositor, &mint_y.pubkey(), &taker.pubkey(), COUNTER).await?;
    let taker_receive: Pubkey = create_token_account(&rpc_client, &depositor, &mint_x.pubkey(), &taker.pubkey(), 0).await?;

    // 4. craft & send initialize tx (record account is created in the same tx)
    let escrow: Keypair = Keypair::new();
    let record_rent: u64 = rpc_client.get_minimum_balance_for_rent_exemption(EscrowRecord::LEN).await?;

    let initialize_ixs: [Instruction; 2] = [
        system_instruction::create_account(
            &depositor.pubkey(),
            &escrow.pubkey(),
            record_rent,
            EscrowRecord::LEN as u64,
            &escrow_exchange::ID
        ),
        escrow_exchange::instruction::initialize(
            &escrow_exchange::ID,
            &depositor.pubkey(),
            &holding,
            &payout,
            &escrow.pubkey(),
            COUNTER
        )
    ];
    send_tx_and_print_result(&rpc_client, &initialize_ixs, &depositor, &[&escrow]).await?;

    // 5. craft & send exchange tx, signed by the taker
    let exchange_ix: Instruction = escrow_exchange::instruction::exchange(
        &escrow_exchange::ID,
        &taker.pubkey(),
        &taker_send,
        &taker_receive,
        &holding,
        &depositor.pubkey(),
        &payout,
        &escrow.pubkey(),
        DEPOSIT
    );
    send_tx_and_print_result(&rpc_client, &[exchange_ix], &taker, &[]).await?;

    log::info!(
        "Depositor received {} Y, taker received {} X",
        token_balance(&rpc_client, &payout).await?,
        token_balance(&rpc_client, &taker_receive).await?
    );

    Ok(())
}

struct Parties {
    depositor: Keypair,
    taker: Keypair
}

async fn init_parties(rpc_client: &RpcClient) -> Result<Parties, Box<dyn std::error::Error>> {
    Ok(if std::env::var("NEW_KEYPAIRS")?.parse::<bool>()? {
        // request airdrops & wait until balances top up
        let parties: Parties = Parties { depositor: Keypair::new(), taker: Keypair::new() };

        for pkey in [parties.depositor.pubkey(), parties.taker.pubkey()] {
            let airdrop_sig: Signature = rpc_client.request_airdrop(&pkey, LAMPORTS_PER_SOL * 5).await?;
            log::info!("Sending airdrop to {}!", pkey);

            loop {
                if rpc_client.confirm_transaction(&airdrop_sig).await? {
                    log::info!("Received airdrop.");
                    break;
                }
            }
        }

        parties
    } else {
        // use existing keypairs
        Parties {
            depositor: Keypair::from_base58_string(&std::env::var("DEPOSITOR_KEYPAIR")?),
            taker: Keypair::from_base58_string(&std::env::var("TAKER_KEYPAIR")?)
        }
    })
}

async fn create_mint(rpc_client: &RpcClient, payer: &Keypair, mint: &Keypair) -> Result<(), Box<dyn std::error::Error>> {
    let rent: u64 = rpc_client.get_minimum_balance_for_rent_exemption(Mint::LEN).await?;

    let ixs: [Instruction; 2] = [
        system_instruction::create_account(&payer.pubkey(), &mint.pubkey(), rent, Mint::LEN as u64, &spl_token::id()),
        spl_token::instruction::initialize_mint(&spl_token::id(), &mint.pubkey(), &payer.pubkey(), None, 0)?
    ];
    send_tx_and_print_result(rpc_client, &ixs, payer, &[mint]).await?;

    Ok(())
}

async fn create_token_account(
    rpc_client: &RpcClient,
    payer: &Keypair,
    mint: &Pubkey,
    owner: &Pubkey,
    balance: u64
) -> Result<Pubkey, Box<dyn std::error::Error>> {
    let account: Keypair = Keypair::new();
    let rent: u64 = rpc_client.get_minimum_balance_for_rent_exemption(TokenAccount::LEN).await?;

    let mut ixs: Vec<Instruction> = vec![
        system_instruction::create_account(&payer.pubkey(), &account.pubkey(), rent, TokenAccount::LEN as u64, &spl_token::id()),
        spl_token::instruction::initialize_account(&spl_token::id(), &account.pubkey(), mint, owner)?
    ];
    if balance > 0 {
        ixs.push(spl_token::instruction::mint_to(&spl_token::id(), mint, &account.pubkey(), &payer.pubkey(), &[], balance)?);
    }
    send_tx_and_print_result(rpc_client, &ixs, payer, &[&account]).await?;

    Ok(account.pubkey())
}

async fn token_balance(rpc_client: &RpcClient, pkey: &Pubkey) -> Result<u64, Box<dyn std::error::Error>> {
    let data: Vec<u8> = rpc_client.get_account_data(pkey).await?;
    Ok(TokenAccount::unpack(&data)?.amount)
}

async fn send_tx_and_print_result(
    rpc_client: &RpcClient,
    ixs: &[Instruction],
    payer: &Keypair,
    extra_signers: &[&Keypair]
) -> solana_rpc_client_api::client_error::Result<()> {
    let latest_blockhash: Hash = rpc_client.get_latest_blockhash().await?;

    let mut signers: Vec<&Keypair> = vec![payer];
    signers.extend_from_slice(extra_signers);
    let tx: Transaction = Transaction::new_signed_with_payer(ixs, Some(&payer.pubkey()), &signers, latest_blockhash);

    log::info!("Sending transaction!");
    match rpc_client.send_and_confirm_transaction(&tx).await {
        Ok(sig) => log::info!("Success! Tx signature: {}", sig),
        Err(e) => log::error!("Error: {}", e)
    };
    Ok(())
}
