// src/store/seed.rs

//! Built-in quiz catalogue.

use crate::models::quiz::{Difficulty, Question, Quiz};

fn question(id: &str, text: &str, options: [&str; 4], correct_answer: usize, explanation: &str) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
        explanation: Some(explanation.to_string()),
        image_url: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn quiz(
    id: &str,
    title: &str,
    description: &str,
    category: &str,
    difficulty: Difficulty,
    time_limit: u32,
    image: &str,
    questions: Vec<Question>,
) -> Quiz {
    Quiz {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        difficulty,
        total_questions: questions.len(),
        questions,
        time_limit: Some(time_limit),
        image_url: Some(format!(
            "https://res.cloudinary.com/demo/image/upload/v1640835445/{}.jpg",
            image
        )),
    }
}

pub fn default_quizzes() -> Vec<Quiz> {
    vec![
        quiz(
            "crypto-basics",
            "Crypto Basics",
            "Test your knowledge of cryptocurrency fundamentals",
            "Cryptocurrency",
            Difficulty::Easy,
            300,
            "crypto_basics",
            vec![
                question(
                    "q1",
                    "What does \"HODL\" mean in crypto?",
                    [
                        "Hold On for Dear Life",
                        "High Output Digital Ledger",
                        "Hybrid Online Data Link",
                        "Hash Output Decentralized Logic",
                    ],
                    0,
                    "HODL originated from a typo of \"hold\" and became a popular strategy.",
                ),
                question(
                    "q2",
                    "What is the maximum supply of Bitcoin?",
                    ["21 million", "100 million", "1 billion", "Unlimited"],
                    0,
                    "Bitcoin has a hard cap of 21 million coins.",
                ),
                question(
                    "q3",
                    "What is a blockchain?",
                    [
                        "A type of cryptocurrency",
                        "A distributed ledger technology",
                        "A mining algorithm",
                        "A wallet application",
                    ],
                    1,
                    "Blockchain is a distributed ledger that records transactions across multiple computers.",
                ),
                question(
                    "q4",
                    "What does \"DeFi\" stand for?",
                    [
                        "Digital Finance",
                        "Decentralized Finance",
                        "Distributed Finance",
                        "Dynamic Finance",
                    ],
                    1,
                    "DeFi stands for Decentralized Finance.",
                ),
                question(
                    "q5",
                    "What is a smart contract?",
                    [
                        "A legal document",
                        "A trading strategy",
                        "Self-executing code on blockchain",
                        "A type of cryptocurrency",
                    ],
                    2,
                    "Smart contracts are self-executing contracts with terms directly written into code.",
                ),
            ],
        ),
        quiz(
            "web3-advanced",
            "Web3 & DApps",
            "Advanced concepts in Web3 and decentralized applications",
            "Web3",
            Difficulty::Hard,
            600,
            "web3_advanced",
            vec![
                question(
                    "q1",
                    "What is the difference between Layer 1 and Layer 2?",
                    [
                        "Layer 1 is faster",
                        "Layer 2 is built on top of Layer 1",
                        "They are the same thing",
                        "Layer 1 is for NFTs only",
                    ],
                    1,
                    "Layer 2 solutions are built on top of Layer 1 blockchains to improve scalability.",
                ),
                question(
                    "q2",
                    "What is gas in Ethereum?",
                    [
                        "A type of token",
                        "Transaction fees",
                        "Mining reward",
                        "Staking mechanism",
                    ],
                    1,
                    "Gas refers to the fee required to execute transactions on the Ethereum network.",
                ),
                question(
                    "q3",
                    "What does \"TVL\" measure in DeFi?",
                    [
                        "Total Value Locked",
                        "Transaction Volume Limit",
                        "Token Velocity Level",
                        "Technical Validation Logic",
                    ],
                    0,
                    "TVL measures the total value of assets locked in a DeFi protocol.",
                ),
                question(
                    "q4",
                    "What is an oracle in blockchain?",
                    [
                        "A prediction market",
                        "Data feed from external sources",
                        "A type of consensus mechanism",
                        "A smart contract template",
                    ],
                    1,
                    "Oracles provide external data to blockchain networks and smart contracts.",
                ),
            ],
        ),
        quiz(
            "nft-knowledge",
            "NFT Fundamentals",
            "Understanding Non-Fungible Tokens and digital ownership",
            "NFTs",
            Difficulty::Medium,
            240,
            "nft_fundamentals",
            vec![
                question(
                    "q1",
                    "What makes an NFT \"non-fungible\"?",
                    [
                        "It cannot be copied",
                        "It is unique and cannot be replaced",
                        "It is expensive",
                        "It is stored on blockchain",
                    ],
                    1,
                    "Non-fungible means each token is unique and cannot be replaced by another identical token.",
                ),
                question(
                    "q2",
                    "What is the most common NFT standard on Ethereum?",
                    ["ERC-20", "ERC-721", "ERC-1155", "ERC-777"],
                    1,
                    "ERC-721 is the most widely used standard for NFTs on Ethereum.",
                ),
                question(
                    "q3",
                    "What is \"minting\" an NFT?",
                    [
                        "Buying an NFT",
                        "Creating a new NFT on the blockchain",
                        "Selling an NFT",
                        "Transferring an NFT",
                    ],
                    1,
                    "Minting is the process of creating a new NFT and recording it on the blockchain.",
                ),
                question(
                    "q4",
                    "What is a \"rug pull\" in NFT projects?",
                    [
                        "A successful launch",
                        "When creators abandon the project after raising funds",
                        "A type of NFT artwork",
                        "A marketing strategy",
                    ],
                    1,
                    "A rug pull occurs when project creators disappear with investors' money.",
                ),
            ],
        ),
    ]
}
